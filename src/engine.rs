//! Tone engine - the control side of the piano.
//!
//! Owns the output context and the backend it renders through. Trigger
//! handlers call [`ToneEngine::resume`] and then [`ToneEngine::play_tone`];
//! everything after that (sweep, envelope, teardown) is already scheduled on
//! the timeline when `play_tone` returns.

use crate::backend::AudioBackend;
use crate::config::EngineConfig;
use crate::context::{ContextState, OutputContext};
use crate::dsp::voice::PianoVoice;
use crate::error::ToneError;
use crate::keyboard::PianoKey;

pub struct ToneEngine {
    config: EngineConfig,
    backend: Box<dyn AudioBackend>,
    context: Option<OutputContext>,
    closed: bool,
}

impl ToneEngine {
    /// Create an engine rendering through `backend`. No output is opened
    /// until the first `ensure_context`, `resume` or `play_tone`.
    pub fn new(config: EngineConfig, backend: impl AudioBackend + 'static) -> Result<Self, ToneError> {
        config.validate()?;
        Ok(ToneEngine {
            config,
            backend: Box::new(backend),
            context: None,
            closed: false,
        })
    }

    /// An engine on the host's default output device.
    #[cfg(feature = "native")]
    pub fn native(config: EngineConfig) -> Result<Self, ToneError> {
        Self::new(config, crate::backend::CpalBackend::new())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> ContextState {
        if self.closed {
            return ContextState::Closed;
        }
        self.context
            .as_ref()
            .map_or(ContextState::Uninitialized, OutputContext::state)
    }

    /// Timeline position in seconds; zero before the context exists.
    pub fn current_time(&self) -> f64 {
        self.context.as_ref().map_or(0.0, OutputContext::current_time)
    }

    /// Negotiated sample rate, once the context exists.
    pub fn sample_rate(&self) -> Option<f64> {
        self.context.as_ref().map(OutputContext::sample_rate)
    }

    /// Voices currently owned by the render side.
    pub fn live_voices(&self) -> usize {
        self.context
            .as_ref()
            .map_or(0, |context| context.timeline().live_voices())
    }

    /// Open the output on first use and return the context. Later calls
    /// return the same context.
    pub fn ensure_context(&mut self) -> Result<&mut OutputContext, ToneError> {
        if self.closed {
            return Err(ToneError::ContextClosed);
        }
        let context = match self.context.take() {
            Some(context) => context,
            None => self.open_context()?,
        };
        Ok(self.context.insert(context))
    }

    fn open_context(&mut self) -> Result<OutputContext, ToneError> {
        let format = self.backend.open(&self.config.output)?;
        let (context, renderer) = OutputContext::create(&self.config, format);
        self.backend.attach(renderer)?;
        log::info!(
            "Output context opened: {} Hz, {} channel(s), suspended",
            format.sample_rate,
            format.channels
        );
        Ok(context)
    }

    /// Start (or restart) the output. Does nothing if already running.
    pub fn resume(&mut self) -> Result<(), ToneError> {
        self.ensure_context()?;
        let Some(context) = self.context.as_mut() else {
            return Err(ToneError::ContextClosed);
        };
        if context.state() == ContextState::Running {
            return Ok(());
        }
        self.backend.resume()?;
        context.set_state(ContextState::Running);
        log::info!("Output context running at {:.3}s", context.current_time());
        Ok(())
    }

    /// Pause the output and freeze the timeline.
    pub fn suspend(&mut self) -> Result<(), ToneError> {
        let Some(context) = self.context.as_mut() else {
            return Ok(());
        };
        if context.state() != ContextState::Running {
            return Ok(());
        }
        self.backend.suspend()?;
        context.set_state(ContextState::Suspended);
        log::info!("Output context suspended at {:.3}s", context.current_time());
        Ok(())
    }

    /// Release the output. Live voices are dropped with the render side.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.backend.close();
        if let Some(mut context) = self.context.take() {
            let released = context.reclaim();
            context.set_state(ContextState::Closed);
            log::info!(
                "Output context closed at {:.3}s ({released} voice(s) released)",
                context.current_time()
            );
        }
    }

    /// Play a piano tone at `frequency` Hz, starting now.
    pub fn play_tone(&mut self, frequency: f64) {
        let now = self.current_time();
        self.schedule_tone(frequency, now);
    }

    /// Play a piano tone at `frequency` Hz, starting at timeline time `at`.
    /// Never fails: problems are logged and the tone is skipped.
    pub fn schedule_tone(&mut self, frequency: f64, at: f64) {
        if !frequency.is_finite() || !at.is_finite() {
            log::warn!("Ignoring tone with non-finite frequency {frequency} or time {at}");
            return;
        }
        let patch = self.config.voice;
        let context = match self.ensure_context() {
            Ok(context) => context,
            Err(e) => {
                log::warn!("Dropping {frequency:.2} Hz tone: {e}");
                return;
            }
        };
        context.reclaim();

        let voice = Box::new(PianoVoice::new(frequency, at, &patch, context.sample_rate()));
        match context.submit(voice) {
            Ok(()) => log::debug!(
                "Scheduled {frequency:.2} Hz at {at:.3}s, teardown at {:.3}s",
                at + patch.duration + patch.teardown_delay
            ),
            Err(_) => log::warn!("Voice queue full, dropping {frequency:.2} Hz tone"),
        }
    }

    /// Resume, then play `key`. The same order a UI key press uses.
    pub fn press(&mut self, key: &PianoKey) -> Result<(), ToneError> {
        self.resume()?;
        self.play_tone(key.frequency_with_tuning(self.config.tuning_pitch));
        Ok(())
    }

    /// Release voices the render side has torn down.
    pub fn reclaim(&mut self) -> usize {
        let released = self.context.as_mut().map_or(0, OutputContext::reclaim);
        if released > 0 {
            log::debug!("Reclaimed {released} voice(s)");
        }
        released
    }
}

impl Drop for ToneEngine {
    fn drop(&mut self) {
        self.close();
    }
}
