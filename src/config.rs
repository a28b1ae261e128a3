//! Engine configuration - master bus dynamics, the piano voice patch and
//! output negotiation. Every field has a default, so a partial JSON document
//! only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::error::ToneError;

// ── Master Bus ──────────────────────────────────────────────

/// Dynamics compressor settings, in the units of the WebAudio
/// DynamicsCompressorNode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorConfig {
    /// Threshold in dB.
    pub threshold: f64,
    /// Knee width in dB.
    pub knee: f64,
    /// Compression ratio (12.0 = 12:1).
    pub ratio: f64,
    /// Attack time in seconds.
    pub attack: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            threshold: -24.0,
            knee: 30.0,
            ratio: 12.0,
            attack: 0.003,
            release: 0.25,
        }
    }
}

/// The shared path every voice feeds: gain trim, then compressor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterBusConfig {
    /// Linear trim applied before compression. Kept below 1.0 to leave
    /// headroom for chords.
    pub gain: f64,
    pub compressor: CompressorConfig,
}

impl Default for MasterBusConfig {
    fn default() -> Self {
        Self {
            gain: 0.6,
            compressor: CompressorConfig::default(),
        }
    }
}

// ── Voice Patch ─────────────────────────────────────────────

/// Timings and levels of a single piano voice. Times are seconds relative to
/// the voice's start; ratios multiply the note frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Time from start until the sources stop.
    pub duration: f64,
    /// Grace period between the stop and node teardown.
    pub teardown_delay: f64,
    /// Detune of the second triangle source, in cents.
    pub detune_cents: f64,
    /// Lowpass resonance in dB.
    pub filter_q: f64,
    pub cutoff_start_ratio: f64,
    pub cutoff_end_ratio: f64,
    /// Time for the cutoff to fall from start ratio to end ratio.
    pub cutoff_decay: f64,
    pub attack: f64,
    pub peak_level: f64,
    /// End of the decay segment.
    pub decay: f64,
    pub sustain_level: f64,
    /// Level reached at `duration`. Exponential ramps cannot reach zero.
    pub release_floor: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            duration: 2.5,
            teardown_delay: 0.1,
            detune_cents: 5.0,
            filter_q: 0.5,
            cutoff_start_ratio: 8.0,
            cutoff_end_ratio: 1.5,
            cutoff_decay: 0.4,
            attack: 0.015,
            peak_level: 1.0,
            decay: 0.2,
            sustain_level: 0.6,
            release_floor: 0.001,
        }
    }
}

// ── Output ──────────────────────────────────────────────────

/// Largest voice queue an output context will allocate.
pub const MAX_QUEUE_CAPACITY: usize = 65536;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Preferred sample rate. `None` takes the device default.
    pub sample_rate: Option<u32>,
    /// Voices that may wait between `play_tone` and the next rendered block.
    pub queue_capacity: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: None,
            queue_capacity: 1024,
        }
    }
}

// ── Engine ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frequency of A4 in Hz.
    pub tuning_pitch: f64,
    pub master: MasterBusConfig,
    pub voice: VoiceConfig,
    pub output: OutputConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tuning_pitch: 440.0,
            master: MasterBusConfig::default(),
            voice: VoiceConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, ToneError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the envelope schedule cannot honour.
    pub fn validate(&self) -> Result<(), ToneError> {
        positive("tuning_pitch", self.tuning_pitch)?;
        non_negative("master.gain", self.master.gain)?;

        let c = &self.master.compressor;
        if !(-100.0..=0.0).contains(&c.threshold) {
            return Err(invalid("master.compressor.threshold", "must be within -100..=0 dB"));
        }
        if !(0.0..=40.0).contains(&c.knee) {
            return Err(invalid("master.compressor.knee", "must be within 0..=40 dB"));
        }
        if !(1.0..=20.0).contains(&c.ratio) {
            return Err(invalid("master.compressor.ratio", "must be within 1..=20"));
        }
        positive("master.compressor.attack", c.attack)?;
        positive("master.compressor.release", c.release)?;

        let v = &self.voice;
        positive("voice.duration", v.duration)?;
        non_negative("voice.teardown_delay", v.teardown_delay)?;
        positive("voice.cutoff_start_ratio", v.cutoff_start_ratio)?;
        positive("voice.cutoff_end_ratio", v.cutoff_end_ratio)?;
        positive("voice.cutoff_decay", v.cutoff_decay)?;
        positive("voice.attack", v.attack)?;
        positive("voice.peak_level", v.peak_level)?;
        positive("voice.sustain_level", v.sustain_level)?;
        positive("voice.release_floor", v.release_floor)?;
        if !v.detune_cents.is_finite() || !v.filter_q.is_finite() {
            return Err(invalid("voice", "detune and resonance must be finite"));
        }
        if !(v.attack < v.decay && v.decay < v.duration) {
            return Err(invalid(
                "voice.decay",
                "envelope points must satisfy attack < decay < duration",
            ));
        }

        if !(1..=MAX_QUEUE_CAPACITY).contains(&self.output.queue_capacity) {
            return Err(invalid(
                "output.queue_capacity",
                &format!("must be within 1..={MAX_QUEUE_CAPACITY}"),
            ));
        }
        if self.output.sample_rate == Some(0) {
            return Err(invalid("output.sample_rate", "must be positive"));
        }
        Ok(())
    }

    /// Timeline seconds from a voice's start until its nodes are torn down.
    pub fn voice_lifetime(&self) -> f64 {
        self.voice.duration + self.voice.teardown_delay
    }
}

fn invalid(field: &'static str, reason: &str) -> ToneError {
    ToneError::InvalidConfig {
        field,
        reason: reason.to_string(),
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ToneError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, &format!("must be positive, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ToneError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, &format!("must not be negative, got {value}")))
    }
}
