//! Pull-driven backend with no device behind it.
//!
//! The caller decides when audio is produced by calling [`OfflineBackend::render`].
//! This drives offline WAV rendering, the AudioWorklet `process` callback and
//! the tests. Handles are cheap clones of one shared output.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::OutputConfig;
use crate::context::OutputFormat;
use crate::dsp::renderer::Renderer;
use crate::error::ToneError;

#[derive(Clone)]
pub struct OfflineBackend {
    shared: Arc<Mutex<OfflineOutput>>,
}

struct OfflineOutput {
    format: OutputFormat,
    renderer: Option<Renderer>,
    running: bool,
    deny_resume: bool,
}

impl OfflineBackend {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        OfflineBackend {
            shared: Arc::new(Mutex::new(OfflineOutput {
                format: OutputFormat {
                    sample_rate,
                    channels: channels.max(1),
                },
                renderer: None,
                running: false,
                deny_resume: false,
            })),
        }
    }

    /// A single-channel output.
    pub fn mono(sample_rate: u32) -> Self {
        Self::new(sample_rate, 1)
    }

    fn output(&self) -> MutexGuard<'_, OfflineOutput> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn format(&self) -> OutputFormat {
        self.output().format
    }

    pub fn is_running(&self) -> bool {
        self.output().running
    }

    /// Make subsequent `resume` calls fail, the way a browser refuses to
    /// start audio before a user gesture.
    pub fn set_deny_resume(&self, deny: bool) {
        self.output().deny_resume = deny;
    }

    /// Fill `out` with interleaved audio. Writes silence and leaves the
    /// timeline where it is while the output is suspended or detached.
    pub fn render(&self, out: &mut [f32]) {
        let mut output = self.output();
        let running = output.running;
        match output.renderer.as_mut() {
            Some(renderer) if running => renderer.render(out),
            _ => out.fill(0.0),
        }
    }

    /// Render `frames` frames into a new buffer.
    pub fn render_frames(&self, frames: usize) -> Vec<f32> {
        let channels = self.format().channels as usize;
        let mut out = vec![0.0; frames * channels];
        self.render(&mut out);
        out
    }
}

impl super::AudioBackend for OfflineBackend {
    fn open(&mut self, preferred: &OutputConfig) -> Result<OutputFormat, ToneError> {
        let mut output = self.output();
        if let Some(sample_rate) = preferred.sample_rate {
            output.format.sample_rate = sample_rate;
        }
        Ok(output.format)
    }

    fn attach(&mut self, renderer: Renderer) -> Result<(), ToneError> {
        let mut output = self.output();
        output.renderer = Some(renderer);
        output.running = false;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), ToneError> {
        let mut output = self.output();
        if output.deny_resume {
            return Err(ToneError::ResumeRejected("resume denied by output".into()));
        }
        if output.renderer.is_none() {
            return Err(ToneError::ResumeRejected("no renderer attached".into()));
        }
        output.running = true;
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), ToneError> {
        self.output().running = false;
        Ok(())
    }

    fn close(&mut self) {
        let mut output = self.output();
        output.running = false;
        output.renderer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::backend::AudioBackend;
    use crate::config::EngineConfig;
    use crate::context::OutputContext;

    fn attached(sample_rate: u32) -> (OfflineBackend, OutputContext) {
        let config = EngineConfig::default();
        let mut backend = OfflineBackend::mono(sample_rate);
        let format = backend.open(&config.output).unwrap();
        let (context, renderer) = OutputContext::create(&config, format);
        backend.attach(renderer).unwrap();
        (backend, context)
    }

    #[test]
    fn preferred_sample_rate_wins() {
        let mut backend = OfflineBackend::new(44100, 2);
        let preferred = OutputConfig {
            sample_rate: Some(22050),
            ..OutputConfig::default()
        };
        let format = backend.open(&preferred).unwrap();
        assert_eq!(format, OutputFormat { sample_rate: 22050, channels: 2 });
    }

    #[test]
    fn suspended_output_is_silent_and_frozen() {
        let (backend, context) = attached(48000);
        let out = backend.render_frames(480);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(context.current_time(), 0.0);
    }

    #[test]
    fn running_output_advances_the_clock() {
        let (mut backend, context) = attached(48000);
        backend.resume().unwrap();
        backend.render_frames(4800);
        assert!((context.current_time() - 0.1).abs() < 1e-12);

        backend.suspend().unwrap();
        backend.render_frames(4800);
        assert!((context.current_time() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn resume_can_be_refused() {
        let (mut backend, _context) = attached(48000);
        backend.set_deny_resume(true);
        assert!(matches!(backend.resume(), Err(ToneError::ResumeRejected(_))));
        assert!(!backend.is_running());
    }

    #[test]
    fn close_detaches_the_renderer() {
        let (mut backend, context) = attached(48000);
        backend.resume().unwrap();
        backend.close();
        assert!(!backend.is_running());
        backend.render_frames(480);
        assert_eq!(context.current_time(), 0.0);
        assert!(backend.resume().is_err());
    }
}
