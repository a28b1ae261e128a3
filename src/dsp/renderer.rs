//! Renderer - the render side of an output context.
//!
//! Runs inside the output callback and never blocks or logs. New voices
//! arrive boxed over a lock-free queue, and torn down voices are sent back the
//! same way to be released on the control side. Nothing is allocated while at
//! most `queue_capacity` voices are live at once. Beyond that the registry
//! grows, and if the return queue is full a retired voice is freed here.

use std::sync::Arc;

use rtrb::{Consumer, Producer};

use crate::config::MasterBusConfig;
use crate::context::Timeline;

use super::bus::MasterBus;
use super::registry::VoiceRegistry;
use super::voice::PianoVoice;

pub struct Renderer {
    bus: MasterBus,
    registry: VoiceRegistry,
    channels: usize,
    timeline: Arc<Timeline>,
    pending: Consumer<Box<PianoVoice>>,
    retired: Producer<Box<PianoVoice>>,
}

impl Renderer {
    pub(crate) fn new(
        master: &MasterBusConfig,
        channels: usize,
        timeline: Arc<Timeline>,
        pending: Consumer<Box<PianoVoice>>,
        retired: Producer<Box<PianoVoice>>,
    ) -> Self {
        let capacity = pending.buffer().capacity();
        Renderer {
            bus: MasterBus::new(master, timeline.sample_rate()),
            registry: VoiceRegistry::with_capacity(capacity),
            channels: channels.max(1),
            timeline,
            pending,
            retired,
        }
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    pub fn live_voices(&self) -> usize {
        self.registry.len()
    }

    /// Fill an interleaved output buffer and advance the timeline by the
    /// number of frames written. The mono bus output is copied to every channel.
    pub fn render(&mut self, out: &mut [f32]) {
        self.admit_pending();

        let first = self.timeline.frames();
        let mut frames = 0u64;
        for frame in out.chunks_exact_mut(self.channels) {
            let t = self.timeline.time_of(first + frames);
            let sample = self.bus.process(self.registry.mix_at(t));
            frame.fill(sample);
            frames += 1;
        }
        // A trailing partial frame cannot carry a sample.
        let rest = out.len() % self.channels;
        if rest > 0 {
            let len = out.len();
            out[len - rest..].fill(0.0);
        }

        let now = self.timeline.time_of(self.timeline.advance(frames));
        self.sweep(now);
    }

    fn admit_pending(&mut self) {
        while let Ok(voice) = self.pending.pop() {
            self.registry.admit(voice);
        }
    }

    fn sweep(&mut self, now: f64) {
        let retired = &mut self.retired;
        // If the return queue is full the voice is released here instead.
        self.registry.sweep(now, |voice| {
            let _ = retired.push(voice);
        });
        self.timeline.set_live_voices(self.registry.len());
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.admit_pending();
        let retired = &mut self.retired;
        self.registry.clear(|voice| {
            let _ = retired.push(voice);
        });
        self.timeline.set_live_voices(0);
    }
}
