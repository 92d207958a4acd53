//! Gain automation

/// A linear ramp between two gain values
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ramp {
    from: f32,
    to: f32,
    start: f64,
    end: f64,
}

/// Gain parameter with linear ramp automation, evaluated on the output clock
#[derive(Debug, Clone, PartialEq)]
pub struct GainParam {
    /// Value outside of any ramp
    value: f32,
    /// Active ramp, if any
    ramp: Option<Ramp>,
}

impl GainParam {
    pub fn new(value: f32) -> Self {
        GainParam { value, ramp: None }
    }

    /// Jump to a value immediately, cancelling any ramp
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
        self.ramp = None;
    }

    /// Ramp linearly from `from` to `to`, starting at `start` for `duration` seconds
    ///
    /// A non-positive duration is a jump to `to`.
    pub fn linear_ramp(&mut self, from: f32, to: f32, start: f64, duration: f64) {
        if duration <= 0.0 {
            self.set_value(to);
            return;
        }
        self.value = to;
        self.ramp = Some(Ramp {
            from,
            to,
            start,
            end: start + duration,
        });
    }

    /// Gain at a point on the output clock
    pub fn value_at(&self, time: f64) -> f32 {
        match self.ramp {
            Some(ramp) if time < ramp.start => ramp.from,
            Some(ramp) if time < ramp.end => {
                let progress = ((time - ramp.start) / (ramp.end - ramp.start)) as f32;
                ramp.from + (ramp.to - ramp.from) * progress
            }
            _ => self.value,
        }
    }

    /// The value the parameter settles at once any ramp completes
    pub fn target(&self) -> f32 {
        self.value
    }

    /// Whether a ramp is still running at `time`
    pub fn is_ramping(&self, time: f64) -> bool {
        self.ramp.map_or(false, |ramp| time < ramp.end)
    }
}

impl Default for GainParam {
    fn default() -> Self {
        Self::new(1.0)
    }
}
