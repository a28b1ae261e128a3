//! Scheduled oscillators - a phase accumulator that only sounds between its
//! start and stop times on the context timeline.

use std::f64::consts::TAU;

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Sine,
    Triangle,
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    pub frequency: f64,
    pub detune: f64, // in cents
    phase: f64,
    sample_rate: f64,
    start_time: f64,
    stop_time: f64,
}

impl Oscillator {
    /// A silent oscillator; nothing sounds until `start` is scheduled.
    pub fn new(waveform: Waveform, sample_rate: f64) -> Self {
        Oscillator {
            waveform,
            frequency: 440.0,
            detune: 0.0,
            phase: 0.0,
            sample_rate,
            start_time: f64::INFINITY,
            stop_time: f64::INFINITY,
        }
    }

    /// Schedule the oscillator to begin at timeline time `when`, phase zero.
    pub fn start(&mut self, when: f64) {
        self.start_time = when;
        self.phase = 0.0;
    }

    /// Schedule the oscillator to fall silent at `when`.
    pub fn stop(&mut self, when: f64) {
        self.stop_time = when;
    }

    pub fn stop_time(&self) -> f64 {
        self.stop_time
    }

    pub fn is_playing_at(&self, t: f64) -> bool {
        t >= self.start_time && t < self.stop_time
    }

    /// Effective frequency accounting for detune (in cents).
    pub fn effective_freq(&self) -> f64 {
        self.frequency * 2.0_f64.powf(self.detune / 1200.0)
    }

    fn phase_inc(&self) -> f64 {
        self.effective_freq() / self.sample_rate
    }

    /// Output at timeline time `t`, advancing one sample while playing.
    pub fn sample_at(&mut self, t: f64) -> f64 {
        if !self.is_playing_at(t) {
            return 0.0;
        }

        let sample = match self.waveform {
            Waveform::Sine => (TAU * self.phase).sin(),
            Waveform::Triangle => triangle(self.phase),
        };

        self.phase = (self.phase + self.phase_inc()).rem_euclid(1.0);
        sample
    }
}

/// Triangle starting at zero and rising, peaks at phase 0.25 and 0.75.
fn triangle(phase: f64) -> f64 {
    1.0 - 4.0 * ((phase + 0.25).rem_euclid(1.0) - 0.5).abs()
}
