use std::error::Error;

use crate::{agent::Policy, memory::Exp};

/// Whether an episode is played to learn from or to measure the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Policies act through [`Policy::step`] and every seat's interactions are recorded
    Training,
    /// Policies act through [`Policy::eval_step`] and only the payoffs matter
    Evaluation,
}

/// The ordered interactions of one seat during one episode
pub type Trajectory<E> = Vec<Exp<E>>;

/// The final outcome of one episode, indexed by seat
pub type Payoffs = Vec<f32>;

/// The result of playing one episode
pub struct Episode<E: Environment> {
    /// One trajectory per seat, in seat order. Empty when the episode was played in [`Mode::Evaluation`].
    pub trajectories: Vec<Trajectory<E>>,
    /// The payoff of every seat
    pub payoffs: Payoffs,
}

impl<E: Environment> Episode<E> {
    /// Take the trajectory of `seat`, discarding all the others
    pub fn into_trajectory(self, seat: usize) -> Option<Trajectory<E>> {
        self.trajectories.into_iter().nth(seat)
    }

    /// Payoff of `seat`
    pub fn payoff(&self, seat: usize) -> Option<f32> {
        self.payoffs.get(seat).copied()
    }
}

/// A multi-seat simulator that plays whole episodes
///
/// The environment never owns the policies sitting at its table. Instead the caller passes one
/// policy per seat to every [`run`](Environment::run), seat 0 being the controlled agent.
pub trait Environment: Sized {
    /// A representation of the state of the environment as observed by one seat
    type State: Clone;

    /// A representation of an action that a seat can take to affect the environment
    type Action: Clone;

    /// The failure raised when an episode cannot be played
    type Error: Error + Send + Sync + 'static;

    /// Number of seats at the table
    fn num_players(&self) -> usize;

    /// Size of the discrete action space
    fn num_actions(&self) -> usize;

    /// Shape of a single observed state
    fn state_shape(&self) -> Vec<usize>;

    /// Total number of decisions taken by every seat since construction
    ///
    /// This is for display only; the harness keeps its own interaction counter.
    fn timestep(&self) -> u64;

    /// Play exactly one episode with `seats[i]` acting for seat `i`
    ///
    /// In [`Mode::Training`] the returned [`Episode`] holds one trajectory per seat; in
    /// [`Mode::Evaluation`] the trajectories may be left empty.
    fn run(
        &mut self,
        seats: &mut [&mut dyn Policy<Self>],
        mode: Mode,
    ) -> Result<Episode<Self>, Self::Error>;
}
