//! Biquad lowpass - WebAudio BiquadFilterNode "lowpass" coefficients.

use std::f64::consts::PI;

/// A 2nd-order IIR lowpass.
///
/// Direct Form II Transposed. Coefficients follow the Audio EQ Cookbook with
/// the WebAudio convention that Q is given in dB for the lowpass response.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    pub frequency: f64,
    /// Resonance in dB.
    pub q: f64,

    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    z1: f64,
    z2: f64,

    sample_rate: f64,
    dirty: bool,
}

impl BiquadFilter {
    pub fn lowpass(sample_rate: f64) -> Self {
        let mut f = BiquadFilter {
            frequency: 350.0,
            q: 1.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
            sample_rate,
            dirty: true,
        };
        f.update_coefficients();
        f
    }

    pub fn nyquist(&self) -> f64 {
        self.sample_rate / 2.0
    }

    /// Recompute coefficients from the current cutoff and resonance.
    pub fn update_coefficients(&mut self) {
        let normalized = (self.frequency / self.nyquist()).clamp(0.0, 1.0);
        self.dirty = false;

        if normalized >= 1.0 {
            // Cutoff at Nyquist passes everything.
            self.set_normalized(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
            return;
        }
        if normalized <= 0.0 {
            // Cutoff at DC passes nothing.
            self.set_normalized(0.0, 0.0, 0.0, 1.0, 0.0, 0.0);
            return;
        }

        let w0 = PI * normalized;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * 10.0_f64.powf(self.q / 20.0));

        let b1 = 1.0 - cos_w0;
        let b0 = b1 / 2.0;
        self.set_normalized(b0, b1, b0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha);
    }

    fn set_normalized(&mut self, b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) {
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    /// Process a single sample through the filter.
    pub fn process(&mut self, input: f64) -> f64 {
        if self.dirty {
            self.update_coefficients();
        }

        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    /// Set the cutoff; coefficients are recomputed lazily on the next sample.
    pub fn set_frequency(&mut self, freq: f64) {
        if freq != self.frequency {
            self.frequency = freq;
            self.dirty = true;
        }
    }

    pub fn set_q(&mut self, q: f64) {
        if q != self.q {
            self.q = q;
            self.dirty = true;
        }
    }
}
