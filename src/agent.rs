use std::error::Error;

use rand::{seq::SliceRandom, thread_rng};

use crate::{env::Environment, memory::Exp};

/// Anything that can choose an action for a seat
///
/// `legal` is never empty for a well-behaved [`Environment`]. A policy returns `None` when it is, or
/// when it cannot make sense of `state`; environments treat that as a failure of the episode.
pub trait Policy<E: Environment> {
    /// Choose an action while collecting training data (exploration allowed)
    fn step(&mut self, state: &E::State, legal: &[E::Action]) -> Option<E::Action>;

    /// Choose an action with the fixed policy used during evaluation
    fn eval_step(&mut self, state: &E::State, legal: &[E::Action]) -> Option<E::Action>;
}

/// A policy that learns online from its own interactions
pub trait Agent<E: Environment>: Policy<E> {
    /// The failure raised by an optimization step
    type Error: Error + Send + Sync + 'static;

    /// Store one interaction for later learning
    fn memorize(&mut self, exp: Exp<E>);

    /// Perform one optimization step
    ///
    /// **Returns** the scalar training loss of the step
    fn optimize(&mut self) -> Result<f32, Self::Error>;
}

/// A baseline that picks uniformly among the legal actions, in both modes
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomAgent;

impl RandomAgent {
    pub fn new() -> Self {
        Self
    }
}

impl<E: Environment> Policy<E> for RandomAgent {
    fn step(&mut self, _state: &E::State, legal: &[E::Action]) -> Option<E::Action> {
        legal.choose(&mut thread_rng()).cloned()
    }

    fn eval_step(&mut self, state: &E::State, legal: &[E::Action]) -> Option<E::Action> {
        Policy::<E>::step(self, state, legal)
    }
}
