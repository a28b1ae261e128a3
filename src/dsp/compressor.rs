//! Compressor - dynamics processing for the master bus.
//!
//! Feed-forward peak compressor with threshold, soft knee, ratio, attack and
//! release, parameterised like the WebAudio DynamicsCompressorNode.

use crate::config::CompressorConfig;

/// Unlike the WebAudio DynamicsCompressorNode there is no automatic makeup
/// gain: output never exceeds input, so a compressed mix sits lower than the
/// same mix in a browser.
#[derive(Debug, Clone)]
pub struct Compressor {
    threshold: f64,
    knee: f64,
    ratio: f64,
    attack_coef: f64,
    release_coef: f64,
    envelope: f64, // linear
}

impl Compressor {
    pub fn new(config: &CompressorConfig, sample_rate: f64) -> Self {
        Self {
            threshold: config.threshold,
            knee: config.knee,
            ratio: config.ratio,
            attack_coef: smoothing_coef(config.attack, sample_rate),
            release_coef: smoothing_coef(config.release, sample_rate),
            envelope: 0.0,
        }
    }

    #[inline]
    fn linear_to_db(linear: f64) -> f64 {
        if linear <= 0.0 {
            -120.0
        } else {
            20.0 * linear.log10()
        }
    }

    #[inline]
    fn db_to_linear(db: f64) -> f64 {
        10.0_f64.powf(db / 20.0)
    }

    /// Gain change in dB (zero or negative) for an input level in dB.
    #[inline]
    fn compute_gain(&self, input_db: f64) -> f64 {
        let slope = 1.0 - 1.0 / self.ratio;

        if self.knee <= 0.0 {
            return if input_db <= self.threshold {
                0.0
            } else {
                (self.threshold - input_db) * slope
            };
        }

        let half_knee = self.knee / 2.0;
        let knee_start = self.threshold - half_knee;
        let knee_end = self.threshold + half_knee;

        if input_db <= knee_start {
            0.0
        } else if input_db >= knee_end {
            (self.threshold - input_db) * slope
        } else {
            // Quadratic blend across the knee.
            let x = input_db - knee_start;
            -slope * x * x / (2.0 * self.knee)
        }
    }

    /// Process one mono sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let level = input.abs();
        let coef = if level > self.envelope {
            self.attack_coef
        } else {
            self.release_coef
        };
        self.envelope = coef * self.envelope + (1.0 - coef) * level;

        let reduction_db = self.compute_gain(Self::linear_to_db(self.envelope));
        input * Self::db_to_linear(reduction_db)
    }

    /// Current gain reduction in dB, as a positive number.
    pub fn gain_reduction(&self) -> f64 {
        -self.compute_gain(Self::linear_to_db(self.envelope))
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}

/// One-pole smoothing coefficient reaching ~63% in `seconds`.
fn smoothing_coef(seconds: f64, sample_rate: f64) -> f64 {
    (-1.0 / (seconds * sample_rate)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(threshold: f64, knee: f64, ratio: f64, attack: f64, release: f64) -> Compressor {
        let config = CompressorConfig {
            threshold,
            knee,
            ratio,
            attack,
            release,
        };
        Compressor::new(&config, 44100.0)
    }

    #[test]
    fn passthrough_below_knee() {
        let mut comp = Compressor::new(&CompressorConfig::default(), 44100.0);
        // -46 dB sits below the knee that starts at -39 dB.
        for _ in 0..2000 {
            comp.process(0.005);
        }
        let out = comp.process(0.005);
        assert!((out - 0.005).abs() < 1e-6, "Below knee should be untouched: got {out}");
    }

    #[test]
    fn reduces_loud_signals() {
        let mut comp = with(-12.0, 0.0, 4.0, 0.001, 0.1);
        for _ in 0..5000 {
            comp.process(1.0);
        }
        let out = comp.process(1.0);
        // 12 dB over at 4:1 leaves 3 dB over threshold: -9 dB overall.
        assert!((out - 0.355).abs() < 0.02, "Expected ~-9dB, got {out}");
        assert!((comp.gain_reduction() - 9.0).abs() < 0.3);
    }

    #[test]
    fn output_never_exceeds_input() {
        let mut comp = Compressor::new(&CompressorConfig::default(), 44100.0);
        for level in [0.001, 0.01, 0.05, 0.2, 0.5, 1.0, 1.0, 0.3, 0.02] {
            for _ in 0..2000 {
                let out = comp.process(level);
                assert!(out <= level, "{level} came out as {out}");
            }
        }

        // 0 dB in at 12:1 over a -24 dB threshold settles near -22 dB, with
        // nothing added back.
        comp.reset();
        for _ in 0..5000 {
            comp.process(1.0);
        }
        let out = comp.process(1.0);
        assert!((out - 0.079).abs() < 0.01, "got {out}");
    }

    #[test]
    fn knee_is_continuous() {
        let comp = Compressor::new(&CompressorConfig::default(), 44100.0);
        let eps = 1e-6;
        for edge in [-39.0, -9.0] {
            let below = comp.compute_gain(edge - eps);
            let above = comp.compute_gain(edge + eps);
            assert!((below - above).abs() < 1e-4, "Gain jumps at {edge} dB");
        }
    }

    #[test]
    fn attack_takes_time() {
        let mut comp = with(-20.0, 0.0, 10.0, 0.01, 0.5);
        let first = comp.process(1.0);
        for _ in 0..500 {
            comp.process(1.0);
        }
        let later = comp.process(1.0);
        assert!(first > later, "first={first}, later={later}");
    }

    #[test]
    fn release_recovers_gain() {
        let mut comp = with(-20.0, 0.0, 10.0, 0.001, 0.05);
        for _ in 0..1000 {
            comp.process(1.0);
        }
        let compressed = comp.process(0.1);
        for _ in 0..5000 {
            comp.process(0.1);
        }
        let released = comp.process(0.1);
        assert!(released > compressed, "compressed={compressed}, released={released}");

        comp.reset();
        assert_eq!(comp.gain_reduction(), 0.0);
    }
}
