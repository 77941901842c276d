use thiserror::Error;

/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f32) -> f32;
}

#[derive(Debug, Error, PartialEq)]
pub enum DecayError {
    #[error("`vi - vf` must have the same sign as `rate` (rate {rate}, vi {vi}, vf {vf})")]
    Direction { rate: f32, vi: f32, vf: f32 },
    #[error("decay over {0} steps is not possible, use at least one step")]
    NoSteps(u64),
}

/// v(t) = max(v<sub>i</sub> - rt, v<sub>f</sub>)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linear {
    rate: f32,
    vi: f32,
    vf: f32,
}

impl Linear {
    pub fn new(rate: f32, vi: f32, vf: f32) -> Result<Self, DecayError> {
        if (rate >= 0.0 && vi >= vf) || (rate < 0.0 && vi <= vf) {
            Ok(Self { rate, vi, vf })
        } else {
            Err(DecayError::Direction { rate, vi, vf })
        }
    }

    /// Decay from `vi` to `vf` over exactly `steps` time units
    pub fn over(steps: u64, vi: f32, vf: f32) -> Result<Self, DecayError> {
        if steps == 0 {
            return Err(DecayError::NoSteps(steps));
        }
        Self::new((vi - vf) / steps as f32, vi, vf)
    }
}

impl Decay for Linear {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { rate, vi, vf } = self;
        if rate >= 0.0 {
            (vi - rate * t).max(vf)
        } else {
            (vi - rate * t).min(vf)
        }
    }
}
