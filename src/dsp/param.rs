//! Scheduled parameter automation.
//!
//! An `AudioParam` holds a default value and a time-ordered list of
//! automation events on the context timeline. Values are evaluated the way
//! the WebAudio AudioParam does: ramps run from the previous event's time and
//! value to their own target, and the last value holds forever after.

/// One automation entry. Times are timeline seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationEvent {
    /// Jump to `value` at `time`.
    SetValue { value: f64, time: f64 },
    /// Ramp linearly from the previous event to `value`, arriving at `end_time`.
    LinearRamp { value: f64, end_time: f64 },
    /// Ramp exponentially from the previous event to `value`, arriving at `end_time`.
    ExponentialRamp { value: f64, end_time: f64 },
}

impl AutomationEvent {
    fn time(&self) -> f64 {
        match *self {
            AutomationEvent::SetValue { time, .. } => time,
            AutomationEvent::LinearRamp { end_time, .. } => end_time,
            AutomationEvent::ExponentialRamp { end_time, .. } => end_time,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioParam {
    default_value: f64,
    events: Vec<AutomationEvent>,
}

impl AudioParam {
    pub fn new(default_value: f64) -> Self {
        AudioParam {
            default_value,
            events: Vec::with_capacity(4),
        }
    }

    pub fn set_value_at_time(&mut self, value: f64, time: f64) -> &mut Self {
        self.insert(AutomationEvent::SetValue { value, time })
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f64, end_time: f64) -> &mut Self {
        self.insert(AutomationEvent::LinearRamp { value, end_time })
    }

    pub fn exponential_ramp_to_value_at_time(&mut self, value: f64, end_time: f64) -> &mut Self {
        self.insert(AutomationEvent::ExponentialRamp { value, end_time })
    }

    /// Keep events sorted by time; equal times keep insertion order.
    fn insert(&mut self, event: AutomationEvent) -> &mut Self {
        let at = self
            .events
            .iter()
            .position(|e| e.time() > event.time())
            .unwrap_or(self.events.len());
        self.events.insert(at, event);
        self
    }

    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// Value of the parameter at timeline time `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        let mut prev_time = 0.0;
        let mut prev_value = self.default_value;

        for event in &self.events {
            match *event {
                AutomationEvent::SetValue { value, time } => {
                    if t < time {
                        return prev_value;
                    }
                    prev_time = time;
                    prev_value = value;
                }
                AutomationEvent::LinearRamp { value, end_time } => {
                    if t < end_time {
                        if t <= prev_time {
                            return prev_value;
                        }
                        let progress = (t - prev_time) / (end_time - prev_time);
                        return prev_value + (value - prev_value) * progress;
                    }
                    prev_time = end_time;
                    prev_value = value;
                }
                AutomationEvent::ExponentialRamp { value, end_time } => {
                    if t < end_time {
                        if t <= prev_time {
                            return prev_value;
                        }
                        // Undefined for zero or sign-crossing endpoints: hold.
                        if prev_value == 0.0 || prev_value * value < 0.0 {
                            return prev_value;
                        }
                        let progress = (t - prev_time) / (end_time - prev_time);
                        return prev_value * (value / prev_value).powf(progress);
                    }
                    prev_time = end_time;
                    prev_value = value;
                }
            }
        }

        prev_value
    }
}
