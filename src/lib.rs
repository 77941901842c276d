/// Seat policies and learning agents
pub mod agent;

/// Implemented RL algorithms
pub mod algo;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Data structures
pub mod ds;

/// Environment
pub mod env;

/// Exploration policies
pub mod exploration;

/// Training and evaluation loop
pub mod harness;

/// Experience replay
pub mod memory;

/// Learning curve rendering
pub mod plot;

/// Testing environments
#[cfg(feature = "gym")]
pub mod gym;

/// Live training dashboard
#[cfg(feature = "viz")]
pub mod viz;
