//! DSP - the piano voice graph and the master bus it feeds.
//!
//! Everything here runs on the render side and is evaluated per sample
//! against the context timeline. The same code drives the native output,
//! the browser AudioWorklet and offline WAV export.

pub mod bus;
pub mod compressor;
pub mod filter;
pub mod oscillator;
pub mod param;
pub mod registry;
pub mod renderer;
pub mod voice;
