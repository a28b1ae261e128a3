//! Piano voice - one transient synthesis graph per key press.
//!
//! ```text
//!   triangle ──┐
//!              ├─► lowpass ──┐
//!   triangle ──┘  (+5 cents) ├─► amplitude ──► master bus
//!   sine ────────────────────┘
//! ```
//!
//! The voice is fully scheduled when it is built: source start/stop, the
//! cutoff sweep and the amplitude envelope are automation on the context
//! timeline, and the teardown time is fixed. Rendering only evaluates the
//! schedule.

use crate::config::VoiceConfig;

use super::filter::BiquadFilter;
use super::oscillator::{Oscillator, Waveform};
use super::param::AudioParam;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// Built, start time not reached yet.
    Scheduled,
    Sounding,
    /// Sources stopped, nodes still connected.
    Stopped,
    /// Torn down. A disconnected voice is never rendered again.
    Disconnected,
}

#[derive(Debug, Clone)]
pub struct PianoVoice {
    frequency: f64,
    start_time: f64,
    stop_time: f64,
    teardown_time: f64,
    body: Oscillator,
    chorus: Oscillator,
    fundamental: Oscillator,
    filter: BiquadFilter,
    cutoff: AudioParam,
    amplitude: AudioParam,
    disconnected: bool,
}

impl PianoVoice {
    /// Build and schedule a voice for `frequency` starting at timeline time `now`.
    pub fn new(frequency: f64, now: f64, patch: &VoiceConfig, sample_rate: f64) -> Self {
        let stop_time = now + patch.duration;

        let mut body = Oscillator::new(Waveform::Triangle, sample_rate);
        let mut chorus = Oscillator::new(Waveform::Triangle, sample_rate);
        chorus.detune = patch.detune_cents;
        let mut fundamental = Oscillator::new(Waveform::Sine, sample_rate);
        for osc in [&mut body, &mut chorus, &mut fundamental] {
            osc.frequency = frequency;
            osc.start(now);
            osc.stop(stop_time);
        }

        let mut filter = BiquadFilter::lowpass(sample_rate);
        filter.set_q(patch.filter_q);

        // Bright attack, mellowing towards the fundamental.
        let mut cutoff = AudioParam::new(filter.frequency);
        cutoff
            .set_value_at_time(frequency * patch.cutoff_start_ratio, now)
            .exponential_ramp_to_value_at_time(
                frequency * patch.cutoff_end_ratio,
                now + patch.cutoff_decay,
            );

        // Linear attack, exponential decay and release.
        let mut amplitude = AudioParam::new(1.0);
        amplitude
            .set_value_at_time(0.0, now)
            .linear_ramp_to_value_at_time(patch.peak_level, now + patch.attack)
            .exponential_ramp_to_value_at_time(patch.sustain_level, now + patch.decay)
            .exponential_ramp_to_value_at_time(patch.release_floor, stop_time);

        PianoVoice {
            frequency,
            start_time: now,
            stop_time,
            teardown_time: stop_time + patch.teardown_delay,
            body,
            chorus,
            fundamental,
            filter,
            cutoff,
            amplitude,
            disconnected: false,
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn stop_time(&self) -> f64 {
        self.stop_time
    }

    pub fn teardown_time(&self) -> f64 {
        self.teardown_time
    }

    pub fn cutoff(&self) -> &AudioParam {
        &self.cutoff
    }

    pub fn amplitude(&self) -> &AudioParam {
        &self.amplitude
    }

    /// The two filtered triangles, then the unfiltered sine.
    pub fn sources(&self) -> [&Oscillator; 3] {
        [&self.body, &self.chorus, &self.fundamental]
    }

    pub fn state_at(&self, t: f64) -> VoiceState {
        if self.disconnected {
            VoiceState::Disconnected
        } else if t < self.start_time {
            VoiceState::Scheduled
        } else if t < self.stop_time {
            VoiceState::Sounding
        } else {
            VoiceState::Stopped
        }
    }

    /// True once the timeline has reached the teardown time.
    pub fn is_expired(&self, now: f64) -> bool {
        now >= self.teardown_time
    }

    /// Tear down all five nodes. Returns false if already disconnected.
    pub fn disconnect(&mut self) -> bool {
        if self.disconnected {
            return false;
        }
        self.disconnected = true;
        true
    }

    /// Render one sample at timeline time `t`.
    #[inline]
    pub fn next_sample(&mut self, t: f64) -> f64 {
        if self.disconnected || t < self.start_time {
            return 0.0;
        }

        // Coefficients are only recomputed while the sweep is moving.
        self.filter.set_frequency(self.cutoff.value_at(t));

        let strings = self.body.sample_at(t) + self.chorus.sample_at(t);
        let filtered = self.filter.process(strings);
        let fundamental = self.fundamental.sample_at(t);

        (filtered + fundamental) * self.amplitude.value_at(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::f64::consts::PI;

    const SR: f64 = 48000.0;

    fn voice(frequency: f64, now: f64) -> PianoVoice {
        PianoVoice::new(frequency, now, &VoiceConfig::default(), SR)
    }

    /// Magnitude of one DFT bin (Goertzel).
    fn bin_energy(samples: &[f64], frequency: f64) -> f64 {
        let coeff = 2.0 * (2.0 * PI * frequency / SR).cos();
        let (mut s1, mut s2) = (0.0_f64, 0.0_f64);
        for &x in samples {
            let s0 = x + coeff * s1 - s2;
            s2 = s1;
            s1 = s0;
        }
        (s1 * s1 + s2 * s2 - coeff * s1 * s2).sqrt() / samples.len() as f64
    }

    fn render(v: &mut PianoVoice, from: f64, to: f64) -> Vec<f64> {
        let first = (from * SR).round() as usize;
        let last = (to * SR).round() as usize;
        (first..last).map(|n| v.next_sample(n as f64 / SR)).collect()
    }

    #[test]
    fn three_sources_two_triangles_and_a_sine() {
        let v = voice(440.0, 0.0);
        let waveforms: Vec<Waveform> = v.sources().iter().map(|o| o.waveform).collect();
        assert_eq!(waveforms, [Waveform::Triangle, Waveform::Triangle, Waveform::Sine]);
    }

    #[test]
    fn sine_bypasses_a_closed_filter() {
        let patch = VoiceConfig {
            cutoff_start_ratio: 0.0001,
            cutoff_end_ratio: 0.0001,
            ..VoiceConfig::default()
        };
        let f = 440.0;
        let t0 = 0.25;
        let mut v = PianoVoice::new(f, t0, &patch, SR);
        let first = (t0 * SR).round() as usize;
        for n in first..first + (0.3 * SR) as usize {
            let t = n as f64 / SR;
            let expected = (2.0 * PI * f * (t - t0)).sin() * v.amplitude().value_at(t);
            let got = v.next_sample(t);
            assert!((got - expected).abs() < 1e-3, "at {t}: got {got}, expected {expected}");
        }
    }

    #[test]
    fn triangles_go_through_the_sweeping_filter() {
        // 480 Hz puts f and 3f on exact bins of a 50 ms window.
        let f = 480.0;
        let mut v = voice(f, 0.0);
        let early = render(&mut v, 0.02, 0.07);
        let _ = render(&mut v, 0.07, 1.0);
        let late = render(&mut v, 1.0, 1.05);

        let early_ratio = bin_energy(&early, 3.0 * f) / bin_energy(&early, f);
        let late_ratio = bin_energy(&late, 3.0 * f) / bin_energy(&late, f);
        assert!(
            late_ratio < 0.5 * early_ratio,
            "third harmonic should fall as the cutoff closes: {early_ratio} -> {late_ratio}"
        );
    }

    #[test]
    fn only_the_second_triangle_is_detuned() {
        let v = voice(261.63, 0.0);
        let detunes: Vec<f64> = v.sources().iter().map(|o| o.detune).collect();
        assert_eq!(detunes, [0.0, 5.0, 0.0]);
        assert!(v.sources().iter().all(|o| o.frequency == 261.63));
    }

    #[test]
    fn cutoff_sweeps_from_eight_to_one_and_a_half_times() {
        let t0 = 1.25;
        let f = 330.0;
        let v = voice(f, t0);
        assert!((v.cutoff().value_at(t0) - 8.0 * f).abs() < 1e-9);
        assert!((v.cutoff().value_at(t0 + 0.4) - 1.5 * f).abs() < 1e-9);
        assert!((v.cutoff().value_at(t0 + 2.0) - 1.5 * f).abs() < 1e-9);

        let mut last = f64::INFINITY;
        for i in 0..=400 {
            let value = v.cutoff().value_at(t0 + i as f64 * 0.001);
            assert!(value <= last, "cutoff rose at step {i}");
            last = value;
        }
    }

    #[test]
    fn amplitude_envelope_hits_its_targets() {
        let t0 = 0.5;
        let v = voice(440.0, t0);
        let amp = v.amplitude();
        assert_eq!(amp.value_at(t0), 0.0);
        assert!((amp.value_at(t0 + 0.015) - 1.0).abs() < 1e-9);
        assert!((amp.value_at(t0 + 0.2) - 0.6).abs() < 1e-9);
        assert!((amp.value_at(t0 + 2.5) - 0.001).abs() < 1e-9);
    }

    #[test]
    fn amplitude_is_monotonic_per_segment() {
        let t0 = 0.0;
        let v = voice(440.0, t0);
        let segments = [(0.0, 0.015, true), (0.015, 0.2, false), (0.2, 2.5, false)];
        for (from, to, rising) in segments {
            let mut prev = v.amplitude().value_at(t0 + from);
            let steps = 200;
            for i in 1..=steps {
                let t = t0 + from + (to - from) * i as f64 / steps as f64;
                let value = v.amplitude().value_at(t);
                if rising {
                    assert!(value >= prev, "attack fell at {t}");
                } else {
                    assert!(value <= prev, "decay rose at {t}");
                }
                prev = value;
            }
        }
    }

    #[test]
    fn lifecycle_follows_the_timeline() {
        let mut v = voice(440.0, 1.0);
        assert_eq!(v.state_at(0.5), VoiceState::Scheduled);
        assert_eq!(v.state_at(1.0), VoiceState::Sounding);
        assert_eq!(v.state_at(3.5), VoiceState::Stopped);
        assert!(v.sources().iter().all(|o| o.stop_time() == 3.5));
        assert!((v.teardown_time() - 3.6).abs() < 1e-12);
        assert!(!v.is_expired(3.59));
        assert!(v.is_expired(v.teardown_time()));

        assert!(v.disconnect());
        assert!(!v.disconnect(), "second disconnect must be refused");
        assert_eq!(v.state_at(2.0), VoiceState::Disconnected);
        assert_eq!(v.next_sample(2.0), 0.0);
    }

    #[test]
    fn renders_sound_then_fades() {
        let mut v = voice(261.63, 0.0);
        let mut early_peak = 0.0_f64;
        let mut late_peak = 0.0_f64;
        for i in 0..(2.6 * SR) as usize {
            let t = i as f64 / SR;
            let s = v.next_sample(t);
            assert!(s.is_finite());
            if t < 0.3 {
                early_peak = early_peak.max(s.abs());
            } else if t > 2.4 {
                late_peak = late_peak.max(s.abs());
            }
        }
        assert!(early_peak > 0.5, "attack should be loud, got {early_peak}");
        assert!(late_peak < 0.01, "tail should be near silent, got {late_peak}");
    }

    #[test]
    fn silent_before_start() {
        let mut v = voice(440.0, 1.0);
        for i in 0..100 {
            assert_eq!(v.next_sample(i as f64 / SR), 0.0);
        }
    }
}
