use log::debug;

use crate::{
    agent::Policy,
    env::{Environment, Mode},
};

use super::HarnessError;

/// Decides when to measure the agent and how
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationScheduler {
    evaluate_every: u64,
    evaluate_num: u64,
}

impl EvaluationScheduler {
    /// Both values must be non-zero, see [`HarnessConfig::validate`](super::HarnessConfig::validate)
    pub fn new(evaluate_every: u64, evaluate_num: u64) -> Self {
        Self {
            evaluate_every,
            evaluate_num,
        }
    }

    /// Evaluation runs on episode 0 and every `evaluate_every` episodes after it
    pub fn is_due(&self, episode: u64) -> bool {
        episode % self.evaluate_every == 0
    }

    /// Play `evaluate_num` evaluation episodes back to back and average seat 0's payoff
    pub fn evaluate<E: Environment>(
        &self,
        env: &mut E,
        seats: &mut [&mut dyn Policy<E>],
    ) -> Result<f64, HarnessError> {
        let mut total = 0.0;
        for _ in 0..self.evaluate_num {
            let episode = env
                .run(seats, Mode::Evaluation)
                .map_err(HarnessError::environment)?;
            total += episode.payoff(0).ok_or(HarnessError::MissingPayoff(0))? as f64;
        }

        let reward = total / self.evaluate_num as f64;
        debug!("evaluated {} episodes, average reward {reward}", self.evaluate_num);
        Ok(reward)
    }

    /// [`evaluate`](Self::evaluate) if `episode` is on the evaluation cadence
    pub fn maybe_evaluate<E: Environment>(
        &self,
        episode: u64,
        env: &mut E,
        seats: &mut [&mut dyn Policy<E>],
    ) -> Result<Option<f64>, HarnessError> {
        if self.is_due(episode) {
            self.evaluate(env, seats).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Decides when the learning curve is rendered during the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotSchedule {
    save_plot_every: u64,
}

impl PlotSchedule {
    pub fn new(save_plot_every: u64) -> Self {
        Self { save_plot_every }
    }

    /// Plots are due on every positive multiple of `save_plot_every`; episode 0 never plots
    pub fn is_due(&self, episode: u64) -> bool {
        episode % self.save_plot_every == 0 && episode > 0
    }
}

#[cfg(test)]
mod tests {
    use crate::{agent::RandomAgent, env::tests::MockEnv, harness::learner::tests::RecordingAgent};

    use super::*;

    #[test]
    fn evaluation_cadence() {
        let scheduler = EvaluationScheduler::new(3, 1);
        let due: Vec<u64> = (0..10).filter(|&e| scheduler.is_due(e)).collect();
        assert_eq!(due, [0, 3, 6, 9]);
    }

    #[test]
    fn plot_cadence_skips_zero() {
        let schedule = PlotSchedule::new(4);
        let due: Vec<u64> = (0..13).filter(|&e| schedule.is_due(e)).collect();
        assert_eq!(due, [4, 8, 12]);
    }

    #[test]
    fn mean_is_exact() {
        let mut env = MockEnv::new(1, vec![1.0, -1.0, 1.0, -1.0]);
        let mut agent = RecordingAgent::default();
        let mut baseline = RandomAgent::new();
        let scheduler = EvaluationScheduler::new(1, 4);

        let mut seats: [&mut dyn Policy<MockEnv>; 2] = [&mut agent, &mut baseline];
        let reward = scheduler.evaluate(&mut env, &mut seats).unwrap();

        assert_eq!(reward, 0.0);
        assert_eq!(env.evaluation_runs, 4, "exactly evaluate_num episodes");
        assert_eq!(env.training_runs, 0, "no training episode played");
        assert_eq!(agent.eval_steps, 4, "agent acted through its fixed policy");
        assert!(agent.memorized.is_empty(), "nothing learned during evaluation");
    }

    #[test]
    fn mean_of_uneven_payoffs() {
        let mut env = MockEnv::new(1, vec![2.0, 0.5, 0.5]);
        let mut agent = RecordingAgent::default();
        let mut baseline = RandomAgent::new();
        let scheduler = EvaluationScheduler::new(2, 3);

        let mut seats: [&mut dyn Policy<MockEnv>; 2] = [&mut agent, &mut baseline];

        let skipped = scheduler.maybe_evaluate(1, &mut env, &mut seats).unwrap();
        assert_eq!(skipped, None);
        let reward = scheduler.maybe_evaluate(2, &mut env, &mut seats).unwrap();
        assert_eq!(reward, Some(1.0));
        assert_eq!(env.evaluation_runs, 3);
    }
}
