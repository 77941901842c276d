use thiserror::Error;

use super::recorder::RecorderError;

/// A failure raised by a collaborator, kept as its original error
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A configuration problem, detected before the first episode
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`{0}` must be at least 1")]
    Zero(&'static str),
    #[error("the {which} environment seats {expected} players but {given} policies were provided")]
    SeatMismatch {
        which: &'static str,
        expected: usize,
        given: usize,
    },
}

/// Every way a harness run can fail. None of them are recoverable.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("environment failed")]
    Environment(#[source] BoxError),
    #[error("agent failed")]
    Agent(#[source] BoxError),
    #[error("metric recorder failed")]
    Recorder(#[from] RecorderError),
    #[error("training episode produced no trajectory for seat {0}")]
    MissingTrajectory(usize),
    #[error("episode produced no payoff for seat {0}")]
    MissingPayoff(usize),
    #[error("the harness has already run all {0} episodes")]
    Finished(u64),
    #[error("the run was aborted by a failure during episode {0}")]
    Aborted(u64),
}

impl HarnessError {
    pub(crate) fn environment(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Environment(Box::new(err))
    }

    pub(crate) fn agent(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Agent(Box::new(err))
    }
}
