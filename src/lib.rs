pub mod backend;
pub mod config;
pub mod context;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod keyboard;
pub mod notes;
pub mod offline;
pub mod worklet;

pub use crate::config::EngineConfig;
pub use crate::context::ContextState;
pub use crate::engine::ToneEngine;
pub use crate::error::ToneError;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::keyboard::{KeyColor, PIANO_KEYS};

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub(crate) fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed: return the piano_tone version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: route `log` output to the browser console and install the
/// panic hook. Safe to call more than once.
#[cfg(feature = "web")]
#[wasm_bindgen]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

/// WASM-exposed: render a single tone at `frequency` to mono f32 samples,
/// from its start until its teardown.
#[wasm_bindgen]
pub fn render_tone_samples(frequency: f64, sample_rate: u32) -> Result<Vec<f32>, JsValue> {
    let tones = [offline::ToneEvent::frequency(frequency, 0.0)];
    offline::render_tones(&EngineConfig::default(), &tones, sample_rate).map_err(js_error)
}

/// WASM-exposed: render a JSON tone list (`[{"note":"C4","time":0}]`) to a WAV byte array.
#[wasm_bindgen]
pub fn render_tones_wav(tones_json: &str, sample_rate: u32) -> Result<Vec<u8>, JsValue> {
    let tones = offline::parse_tones(tones_json).map_err(js_error)?;
    offline::render_tones_wav(&EngineConfig::default(), &tones, sample_rate).map_err(js_error)
}

#[derive(Serialize)]
struct KeyView {
    id: &'static str,
    color: KeyColor,
    shortcut: char,
    frequency: f64,
}

/// WASM-exposed: the playable keys, for laying out the on-screen piano.
#[wasm_bindgen]
pub fn piano_keys() -> Result<JsValue, JsValue> {
    let keys: Vec<KeyView> = PIANO_KEYS
        .iter()
        .map(|key| KeyView {
            id: key.id,
            color: key.color,
            shortcut: key.shortcut,
            frequency: key.frequency(),
        })
        .collect();
    serde_wasm_bindgen::to_value(&keys).map_err(js_error)
}

/// WASM-exposed: the default engine configuration as a JS object.
#[wasm_bindgen]
pub fn default_config() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&EngineConfig::default()).map_err(js_error)
}
