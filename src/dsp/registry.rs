//! Live voice registry.
//!
//! Voices are admitted when the render side receives them and swept once the
//! timeline passes their teardown time. Sweeping happens on the same clock the
//! audio is rendered against, so a voice is never disconnected before its
//! scheduled stop has been rendered.
//!
//! The live list is preallocated for `capacity` voices. Admitting more than
//! that at once grows it, which allocates on the render thread.

use super::voice::PianoVoice;

#[derive(Debug, Default)]
pub struct VoiceRegistry {
    live: Vec<Box<PianoVoice>>,
    admitted: u64,
    retired: u64,
}

impl VoiceRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        VoiceRegistry {
            live: Vec::with_capacity(capacity),
            admitted: 0,
            retired: 0,
        }
    }

    /// Voices that fit before admitting another one reallocates.
    pub fn capacity(&self) -> usize {
        self.live.capacity()
    }

    pub fn admit(&mut self, voice: Box<PianoVoice>) {
        self.admitted += 1;
        self.live.push(voice);
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn admitted(&self) -> u64 {
        self.admitted
    }

    pub fn retired(&self) -> u64 {
        self.retired
    }

    /// Sum of every live voice at timeline time `t`.
    #[inline]
    pub fn mix_at(&mut self, t: f64) -> f64 {
        self.live.iter_mut().map(|v| v.next_sample(t)).sum()
    }

    /// Disconnect and hand over every voice whose teardown time has passed.
    /// Returns how many were retired.
    pub fn sweep(&mut self, now: f64, mut retire: impl FnMut(Box<PianoVoice>)) -> usize {
        let mut count = 0;
        let mut i = 0;
        while i < self.live.len() {
            if self.live[i].is_expired(now) {
                // Mix order is irrelevant, so swap_remove is fine.
                let mut voice = self.live.swap_remove(i);
                if voice.disconnect() {
                    self.retired += 1;
                    count += 1;
                }
                retire(voice);
            } else {
                i += 1;
            }
        }
        count
    }

    /// Disconnect everything regardless of schedule (context close).
    pub fn clear(&mut self, mut retire: impl FnMut(Box<PianoVoice>)) -> usize {
        let mut count = 0;
        for mut voice in self.live.drain(..) {
            if voice.disconnect() {
                self.retired += 1;
                count += 1;
            }
            retire(voice);
        }
        count
    }
}
