use rand::{thread_rng, Rng};

use crate::decay::Decay;

use super::Choice;

/// Epsilon greedy exploration policy with time-decaying epsilon threshold
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D: Decay> {
    epsilon: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self { epsilon: decay }
    }

    /// Epsilon after `t` steps
    pub fn epsilon(&self, t: u64) -> f32 {
        self.epsilon.evaluate(t as f32)
    }

    /// Invoke epsilon greedy policy at step `t`
    pub fn choose(&self, t: u64) -> Choice {
        if thread_rng().gen::<f32>() >= self.epsilon(t) {
            Choice::Exploit
        } else {
            Choice::Explore
        }
    }
}
