//! Audio output backends.
//!
//! A backend owns the platform side of an output context: it negotiates the
//! stream format, takes the [`Renderer`] into its callback, and starts or
//! pauses the stream. The engine only ever talks to this trait.

#[cfg(feature = "native")]
mod cpal_backend;
mod offline;

#[cfg(feature = "native")]
pub use self::cpal_backend::CpalBackend;
pub use self::offline::OfflineBackend;

use crate::config::OutputConfig;
use crate::context::OutputFormat;
use crate::dsp::renderer::Renderer;
use crate::error::ToneError;

pub trait AudioBackend {
    /// Negotiate the output format. Called once, before `attach`.
    fn open(&mut self, preferred: &OutputConfig) -> Result<OutputFormat, ToneError>;

    /// Take ownership of the render side. The output must start paused.
    fn attach(&mut self, renderer: Renderer) -> Result<(), ToneError>;

    fn resume(&mut self) -> Result<(), ToneError>;

    fn suspend(&mut self) -> Result<(), ToneError>;

    /// Stop the output and drop the renderer.
    fn close(&mut self);
}
