//! Master bus - gain trim into the compressor into the destination.
//!
//! Every voice sums into the bus input; the bus is built once per output
//! context and never reconfigured afterwards.

use crate::config::MasterBusConfig;

use super::compressor::Compressor;

#[derive(Debug, Clone)]
pub struct MasterBus {
    gain: f64,
    compressor: Compressor,
}

impl MasterBus {
    pub fn new(config: &MasterBusConfig, sample_rate: f64) -> Self {
        MasterBus {
            gain: config.gain,
            compressor: Compressor::new(&config.compressor, sample_rate),
        }
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    /// Run the summed voice signal through gain → compressor → destination.
    #[inline]
    pub fn process(&mut self, mix: f64) -> f32 {
        let compressed = self.compressor.process(mix * self.gain);
        destination(compressed)
    }
}

/// The output stage cannot represent anything beyond full scale.
#[inline]
pub fn destination(sample: f64) -> f32 {
    sample.clamp(-1.0, 1.0) as f32
}
