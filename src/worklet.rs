//! Browser AudioWorklet binding.
//!
//! The worklet processor owns a [`PianoWorklet`] and calls `process` with its
//! output channel on every render quantum; key handlers post `press_shortcut`
//! or `play_tone` to it. The engine runs entirely inside the worklet scope.

use wasm_bindgen::prelude::*;

use crate::backend::OfflineBackend;
use crate::config::EngineConfig;
use crate::engine::ToneEngine;
use crate::js_error;
use crate::keyboard::key_for_shortcut;

#[wasm_bindgen]
pub struct PianoWorklet {
    engine: ToneEngine,
    output: OfflineBackend,
}

#[wasm_bindgen]
impl PianoWorklet {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: u32) -> Result<PianoWorklet, JsValue> {
        Self::build(EngineConfig::default(), sample_rate)
    }

    /// Create a worklet from a JSON `EngineConfig`; missing fields keep their defaults.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config_json: &str, sample_rate: u32) -> Result<PianoWorklet, JsValue> {
        let config = EngineConfig::from_json(config_json).map_err(js_error)?;
        Self::build(config, sample_rate)
    }

    fn build(config: EngineConfig, sample_rate: u32) -> Result<PianoWorklet, JsValue> {
        let output = OfflineBackend::mono(sample_rate);
        let mut engine = ToneEngine::new(config, output.clone()).map_err(js_error)?;
        engine.ensure_context().map_err(js_error)?;
        Ok(PianoWorklet { engine, output })
    }

    pub fn resume(&mut self) -> Result<(), JsValue> {
        self.engine.resume().map_err(js_error)
    }

    pub fn suspend(&mut self) -> Result<(), JsValue> {
        self.engine.suspend().map_err(js_error)
    }

    pub fn play_tone(&mut self, frequency: f64) {
        self.engine.play_tone(frequency);
    }

    /// Resume and play the key bound to `key`. Returns false for unbound keys.
    pub fn press_shortcut(&mut self, key: char) -> Result<bool, JsValue> {
        let Some(piano_key) = key_for_shortcut(key) else {
            return Ok(false);
        };
        self.engine.press(piano_key).map_err(js_error)?;
        Ok(true)
    }

    /// Fill one output channel. Silence while suspended.
    pub fn process(&mut self, output: &mut [f32]) {
        self.output.render(output);
        self.engine.reclaim();
    }

    pub fn current_time(&self) -> f64 {
        self.engine.current_time()
    }

    pub fn live_voices(&self) -> usize {
        self.engine.live_voices()
    }

    pub fn state(&self) -> String {
        self.engine.state().to_string()
    }
}
