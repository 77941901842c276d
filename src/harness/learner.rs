use log::trace;

use crate::{
    agent::Agent,
    env::{Environment, Trajectory},
};

use super::WarmupGate;

/// What the learner did with one training trajectory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LearnSummary {
    /// Interactions memorized
    pub interactions: usize,
    /// Optimization steps performed
    pub optimizations: usize,
    /// Loss of the last optimization step, if any ran
    pub last_loss: Option<f32>,
}

/// Feeds training trajectories to an agent and owns the interaction counter
#[derive(Debug, Clone)]
pub struct OnlineLearner {
    gate: WarmupGate,
    interactions: u64,
}

impl OnlineLearner {
    pub fn new(gate: WarmupGate) -> Self {
        Self {
            gate,
            interactions: 0,
        }
    }

    /// Interactions fed to the agent since construction
    pub fn interactions(&self) -> u64 {
        self.interactions
    }

    pub fn gate(&self) -> &WarmupGate {
        &self.gate
    }

    /// Memorize every interaction of `trajectory` in order, optimizing after each one once the gate is open
    ///
    /// `on_step` sees the counter value and loss of every optimization step. The first optimization
    /// failure aborts the trajectory; interactions already memorized stay counted.
    pub fn learn<E, A>(
        &mut self,
        agent: &mut A,
        trajectory: Trajectory<E>,
        mut on_step: impl FnMut(u64, f32),
    ) -> Result<LearnSummary, A::Error>
    where
        E: Environment,
        A: Agent<E>,
    {
        let mut summary = LearnSummary::default();

        for exp in trajectory {
            agent.memorize(exp);
            self.interactions += 1;
            summary.interactions += 1;

            if self.gate.should_train(self.interactions) {
                let loss = agent.optimize()?;
                trace!("Step {}, loss: {}", self.interactions, loss);
                on_step(self.interactions, loss);
                summary.optimizations += 1;
                summary.last_loss = Some(loss);
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::fmt;

    use crate::{agent::Policy, env::tests::MockEnv, memory::Exp};

    use super::*;

    #[derive(Debug, PartialEq)]
    pub struct OptimizeError;

    impl fmt::Display for OptimizeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("optimizer diverged")
        }
    }

    impl std::error::Error for OptimizeError {}

    /// Records everything the harness asks of it
    #[derive(Default)]
    pub struct RecordingAgent {
        pub memorized: Vec<i32>,
        /// Number of memorized interactions at each optimization call
        pub optimized_at: Vec<usize>,
        pub eval_steps: usize,
        pub fail_on_optimize: bool,
    }

    impl Policy<MockEnv> for RecordingAgent {
        fn step(&mut self, _state: &i32, legal: &[usize]) -> Option<usize> {
            legal.first().copied()
        }

        fn eval_step(&mut self, _state: &i32, legal: &[usize]) -> Option<usize> {
            self.eval_steps += 1;
            legal.last().copied()
        }
    }

    impl Agent<MockEnv> for RecordingAgent {
        type Error = OptimizeError;

        fn memorize(&mut self, exp: Exp<MockEnv>) {
            self.memorized.push(exp.state);
        }

        fn optimize(&mut self) -> Result<f32, Self::Error> {
            if self.fail_on_optimize {
                return Err(OptimizeError);
            }
            self.optimized_at.push(self.memorized.len());
            Ok(0.5)
        }
    }

    fn trajectory(len: i32) -> Trajectory<MockEnv> {
        (0..len)
            .map(|state| Exp {
                state,
                action: 0,
                next_state: (state + 1 < len).then_some(state + 1),
                reward: 0.0,
            })
            .collect()
    }

    #[test]
    fn counts_every_interaction_once() {
        let mut learner = OnlineLearner::new(WarmupGate::new(100, 0));
        let mut agent = RecordingAgent::default();

        for len in [3, 0, 5] {
            let before = learner.interactions();
            let summary = learner.learn(&mut agent, trajectory(len), |_, _| {}).unwrap();
            assert_eq!(learner.interactions(), before + len as u64);
            assert_eq!(summary.interactions, len as usize);
            assert_eq!(summary.optimizations, 0, "gate still closed");
        }
        assert_eq!(agent.memorized, [0, 1, 2, 0, 1, 2, 3, 4], "temporal order kept");
    }

    #[test]
    fn optimizes_after_each_interaction_past_the_gate() {
        let mut learner = OnlineLearner::new(WarmupGate::new(5, 0));
        let mut agent = RecordingAgent::default();
        let mut steps = Vec::new();

        let first = learner
            .learn(&mut agent, trajectory(3), |step, _| steps.push(step))
            .unwrap();
        assert_eq!(first.optimizations, 0);
        assert_eq!(first.last_loss, None);

        learner
            .learn(&mut agent, trajectory(3), |step, _| steps.push(step))
            .unwrap();
        let third = learner
            .learn(&mut agent, trajectory(3), |step, _| steps.push(step))
            .unwrap();

        assert_eq!(steps, [6, 7, 8, 9]);
        assert_eq!(agent.optimized_at, [6, 7, 8, 9], "memorize precedes optimize");
        assert_eq!(third.optimizations, 3);
        assert_eq!(third.last_loss, Some(0.5));
    }

    #[test]
    fn optimization_failure_propagates() {
        let mut learner = OnlineLearner::new(WarmupGate::new(0, 0));
        let mut agent = RecordingAgent {
            fail_on_optimize: true,
            ..Default::default()
        };

        let result = learner.learn(&mut agent, trajectory(3), |_, _| {});
        assert_eq!(result, Err(OptimizeError));
        assert_eq!(learner.interactions(), 1, "stops at the failing interaction");
    }
}
