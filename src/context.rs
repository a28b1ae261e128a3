//! Output context - the control-side handle on one audio output.
//!
//! The context owns the shared timeline clock and the two lock-free queues
//! that connect it to the render side: new voices travel to the renderer,
//! torn-down voices travel back to be released off the audio thread.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use rtrb::{Consumer, Producer, RingBuffer};

use crate::config::EngineConfig;
use crate::dsp::renderer::Renderer;
use crate::dsp::voice::PianoVoice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// No output has been opened yet.
    Uninitialized,
    /// Output open, timeline frozen.
    Suspended,
    Running,
    /// Output released; cannot be reopened.
    Closed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextState::Uninitialized => "uninitialized",
            ContextState::Suspended => "suspended",
            ContextState::Running => "running",
            ContextState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Format negotiated with the output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Frames rendered so far, shared by the control and render sides.
#[derive(Debug)]
pub struct Timeline {
    sample_rate: f64,
    frames: AtomicU64,
    live_voices: AtomicUsize,
}

impl Timeline {
    pub fn new(sample_rate: f64) -> Self {
        Timeline {
            sample_rate,
            frames: AtomicU64::new(0),
            live_voices: AtomicUsize::new(0),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Timeline position in seconds.
    pub fn current_time(&self) -> f64 {
        self.frames() as f64 / self.sample_rate
    }

    /// Timeline time of frame `frame`.
    #[inline]
    pub fn time_of(&self, frame: u64) -> f64 {
        frame as f64 / self.sample_rate
    }

    /// Move the clock forward; returns the new frame position.
    pub(crate) fn advance(&self, frames: u64) -> u64 {
        self.frames.fetch_add(frames, Ordering::AcqRel) + frames
    }

    pub fn live_voices(&self) -> usize {
        self.live_voices.load(Ordering::Acquire)
    }

    pub(crate) fn set_live_voices(&self, count: usize) {
        self.live_voices.store(count, Ordering::Release);
    }
}

pub struct OutputContext {
    state: ContextState,
    format: OutputFormat,
    timeline: Arc<Timeline>,
    pending: Producer<Box<PianoVoice>>,
    retired: Consumer<Box<PianoVoice>>,
}

impl OutputContext {
    /// Build a suspended context and the renderer that will feed its output.
    pub(crate) fn create(config: &EngineConfig, format: OutputFormat) -> (OutputContext, Renderer) {
        let capacity = config.output.queue_capacity;
        let (pending_tx, pending_rx) = RingBuffer::new(capacity);
        let (retired_tx, retired_rx) = RingBuffer::new(capacity);
        let timeline = Arc::new(Timeline::new(format.sample_rate as f64));

        let renderer = Renderer::new(
            &config.master,
            format.channels as usize,
            timeline.clone(),
            pending_rx,
            retired_tx,
        );
        let context = OutputContext {
            state: ContextState::Suspended,
            format,
            timeline,
            pending: pending_tx,
            retired: retired_rx,
        };
        (context, renderer)
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ContextState) {
        self.state = state;
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn sample_rate(&self) -> f64 {
        self.timeline.sample_rate()
    }

    pub fn current_time(&self) -> f64 {
        self.timeline.current_time()
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    /// Hand a scheduled voice to the render side. Gives the voice back if the
    /// queue is full.
    pub(crate) fn submit(&mut self, voice: Box<PianoVoice>) -> Result<(), Box<PianoVoice>> {
        self.pending.push(voice).map_err(|rtrb::PushError::Full(voice)| voice)
    }

    /// Release every voice the render side has torn down.
    pub(crate) fn reclaim(&mut self) -> usize {
        let mut count = 0;
        while let Ok(voice) = self.retired.pop() {
            drop(voice);
            count += 1;
        }
        count
    }
}
