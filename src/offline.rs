//! Offline rendering - play a list of timed tones through the engine into a
//! buffer or a WAV file, without an audio device.

use serde::{Deserialize, Serialize};

use crate::backend::OfflineBackend;
use crate::config::EngineConfig;
use crate::engine::ToneEngine;
use crate::error::ToneError;
use crate::notes::note_to_frequency_with_tuning;

/// One tone to render: a note name or a raw frequency, and its start time in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(default)]
    pub time: f64,
}

impl ToneEvent {
    pub fn note(note: &str, time: f64) -> Self {
        ToneEvent {
            note: Some(note.to_string()),
            frequency: None,
            time,
        }
    }

    pub fn frequency(frequency: f64, time: f64) -> Self {
        ToneEvent {
            note: None,
            frequency: Some(frequency),
            time,
        }
    }

    /// Frequency in Hz. An explicit frequency wins over a note name.
    pub fn resolve(&self, tuning_pitch: f64) -> Result<f64, ToneError> {
        match (&self.frequency, &self.note) {
            (Some(f), _) => Ok(*f),
            (None, Some(note)) => note_to_frequency_with_tuning(note, tuning_pitch),
            (None, None) => Err(ToneError::InvalidNote {
                text: String::from("tone needs a 'note' or a 'frequency'"),
            }),
        }
    }
}

/// Parse a JSON array of tones.
pub fn parse_tones(json: &str) -> Result<Vec<ToneEvent>, ToneError> {
    Ok(serde_json::from_str(json)?)
}

/// Render `tones` to mono f32 samples. The buffer runs until the last voice
/// has been torn down.
pub fn render_tones(
    config: &EngineConfig,
    tones: &[ToneEvent],
    sample_rate: u32,
) -> Result<Vec<f32>, ToneError> {
    let mut config = *config;
    config.output.sample_rate = Some(sample_rate);

    let mut schedule = Vec::with_capacity(tones.len());
    for tone in tones {
        if !(tone.time.is_finite() && tone.time >= 0.0) {
            return Err(ToneError::InvalidConfig {
                field: "time",
                reason: format!("tone start must be a non-negative number, got {}", tone.time),
            });
        }
        schedule.push((tone.time, tone.resolve(config.tuning_pitch)?));
    }
    schedule.sort_by(|a, b| a.0.total_cmp(&b.0));

    let output = OfflineBackend::mono(sample_rate);
    let mut engine = ToneEngine::new(config, output.clone())?;
    engine.resume()?;

    let sr = sample_rate as f64;
    let end = schedule.last().map_or(0.0, |(time, _)| *time) + config.voice_lifetime();
    let total = (end * sr).ceil() as usize;
    let mut samples = vec![0.0_f32; total];
    let mut rendered = 0;

    // Render up to each start so the voice queue never holds more than one
    // instant's worth of tones.
    for (time, frequency) in schedule {
        let until = ((time * sr).floor() as usize).min(total);
        if until > rendered {
            output.render(&mut samples[rendered..until]);
            rendered = until;
        }
        engine.schedule_tone(frequency, time);
    }
    output.render(&mut samples[rendered..]);
    engine.close();

    Ok(samples)
}

/// Render `tones` to a 16-bit mono PCM WAV file.
pub fn render_tones_wav(
    config: &EngineConfig,
    tones: &[ToneEvent],
    sample_rate: u32,
) -> Result<Vec<u8>, ToneError> {
    let samples = render_tones(config, tones, sample_rate)?;
    let pcm: Vec<i16> = samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect();
    Ok(encode_wav(&pcm, sample_rate, 1))
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}
