//! The training and evaluation loop
//!
//! A [`Harness`] repeatedly plays one training episode, feeds the controlled seat's trajectory to
//! the agent, evaluates the agent against its baselines on a fixed cadence, and renders the
//! learning curve on another cadence. Everything runs sequentially on the calling thread and any
//! collaborator failure ends the run.

mod config;
mod error;
mod gate;
mod learner;
mod progress;
mod recorder;
mod scheduler;

use std::{
    path::PathBuf,
    sync::mpsc::{self, Receiver},
};

use log::{debug, info, warn};

pub use config::HarnessConfig;
pub use error::{BoxError, ConfigError, HarnessError};
pub use gate::WarmupGate;
pub use learner::{LearnSummary, OnlineLearner};
pub use progress::{Console, Progress, ProgressSink};
pub use recorder::{MetricRecorder, Point, RecorderError};
pub use scheduler::{EvaluationScheduler, PlotSchedule};

use crate::{
    agent::{Agent, Policy},
    env::{Environment, Mode, Trajectory},
};

/// Seat of the learning agent at every table
pub const CONTROLLED_SEAT: usize = 0;

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Generating,
    Learning,
    EvaluationCheck,
    PlotCheck,
    Done,
    /// A collaborator failed; the run cannot continue
    Failed,
}

/// What one iteration of the loop did
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub episode: u64,
    pub learned: LearnSummary,
    pub evaluation: Option<Point>,
    pub plot: Option<PathBuf>,
}

fn seat_table<'a, E, A>(
    agent: &'a mut A,
    opponents: &'a mut [Box<dyn Policy<E>>],
) -> Vec<&'a mut dyn Policy<E>>
where
    E: Environment,
    A: Agent<E>,
{
    let mut seats: Vec<&'a mut dyn Policy<E>> = Vec::with_capacity(opponents.len() + 1);
    seats.push(agent);
    seats.extend(opponents.iter_mut().map(|o| o.as_mut() as &mut dyn Policy<E>));
    seats
}

fn emit(sinks: &mut Vec<Box<dyn ProgressSink>>, event: Progress) {
    sinks.retain_mut(|sink| {
        let alive = sink.on_progress(&event);
        if !alive {
            warn!("progress subscriber went away, dropping it");
        }
        alive
    });
}

/// Drives an [`Agent`] through training episodes on one environment and evaluations on another
pub struct Harness<E, A>
where
    E: Environment,
    A: Agent<E>,
{
    config: HarnessConfig,
    env: E,
    eval_env: E,
    agent: A,
    opponents: Vec<Box<dyn Policy<E>>>,
    learner: OnlineLearner,
    evaluation: EvaluationScheduler,
    plots: PlotSchedule,
    recorder: MetricRecorder,
    figure_dir: PathBuf,
    episode: u64,
    state: State,
    sinks: Vec<Box<dyn ProgressSink>>,
}

impl<E, A> Harness<E, A>
where
    E: Environment,
    A: Agent<E>,
{
    /// Set up a run
    ///
    /// `agent` takes seat 0 of both environments and `opponents` the remaining seats in order.
    /// Fails before anything is played if the configuration is invalid or the seat count of either
    /// environment does not match.
    pub fn new(
        config: HarnessConfig,
        env: E,
        eval_env: E,
        agent: A,
        opponents: Vec<Box<dyn Policy<E>>>,
        recorder: MetricRecorder,
    ) -> Result<Self, HarnessError> {
        config.validate()?;

        let given = opponents.len() + 1;
        for (which, seated) in [("training", &env), ("evaluation", &eval_env)] {
            let expected = seated.num_players();
            if expected != given {
                return Err(ConfigError::SeatMismatch {
                    which,
                    expected,
                    given,
                }
                .into());
            }
        }

        Ok(Self {
            learner: OnlineLearner::new(WarmupGate::new(config.memory_init_size, config.norm_step)),
            evaluation: EvaluationScheduler::new(config.evaluate_every, config.evaluate_num),
            plots: PlotSchedule::new(config.save_plot_every),
            config,
            env,
            eval_env,
            agent,
            opponents,
            recorder,
            figure_dir: PathBuf::from("figures"),
            episode: 0,
            state: State::Idle,
            sinks: Vec::new(),
        })
    }

    /// Directory the learning curve renders are written to, `figures` by default
    pub fn with_figure_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.figure_dir = dir.into();
        self
    }

    /// Forward every [`Progress`] event to `sink`
    pub fn add_sink(&mut self, sink: impl ProgressSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// A lazy stream of every [`Progress`] event from now on
    pub fn subscribe(&mut self) -> Receiver<Progress> {
        let (tx, rx) = mpsc::channel();
        self.add_sink(tx);
        rx
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Index of the next training episode
    pub fn episode(&self) -> u64 {
        self.episode
    }

    /// Interactions fed to the agent so far
    pub fn interactions(&self) -> u64 {
        self.learner.interactions()
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut A {
        &mut self.agent
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn eval_env(&self) -> &E {
        &self.eval_env
    }

    pub fn recorder(&self) -> &MetricRecorder {
        &self.recorder
    }

    /// Path the learning curve is rendered to after `episode`
    pub fn figure_path(&self, episode: u64) -> PathBuf {
        self.figure_dir.join(format!("{episode}.txt"))
    }

    /// Play every configured episode, then render the final learning curve
    pub fn run(&mut self) -> Result<(), HarnessError> {
        info!(
            "training for {} episodes, learning after {} interactions",
            self.config.episode_num,
            self.learner.gate().threshold()
        );

        while self.episode < self.config.episode_num {
            self.step_episode()?;
        }
        self.finish()
    }

    /// Run one iteration of the loop: generate, learn, maybe evaluate, maybe plot
    ///
    /// Any error is fatal: afterwards both this and [`finish`](Self::finish) refuse to run.
    pub fn step_episode(&mut self) -> Result<Transition, HarnessError> {
        self.ensure_running()?;
        if self.episode >= self.config.episode_num {
            return Err(HarnessError::Finished(self.config.episode_num));
        }
        self.advance().inspect_err(|_| self.state = State::Failed)
    }

    fn advance(&mut self) -> Result<Transition, HarnessError> {
        let episode = self.episode;

        self.state = State::Generating;
        let trajectory = self.generate()?;

        self.state = State::Learning;
        let learned = self.learn(trajectory)?;

        self.state = State::EvaluationCheck;
        let evaluation = self.maybe_evaluate(episode)?;

        self.state = State::PlotCheck;
        let plot = if self.plots.is_due(episode) {
            Some(self.render(episode)?)
        } else {
            None
        };

        debug!(
            "episode {episode} done: {} interactions, {} optimization steps",
            learned.interactions, learned.optimizations
        );
        emit(
            &mut self.sinks,
            Progress::EpisodeEnd {
                episode,
                interactions: self.learner.interactions(),
            },
        );

        self.episode += 1;
        self.state = State::Idle;
        Ok(Transition {
            episode,
            learned,
            evaluation,
            plot,
        })
    }

    /// Render the complete learning curve one last time, keyed by the last episode played
    ///
    /// This happens even when that episode already rendered on the plot cadence.
    pub fn finish(&mut self) -> Result<(), HarnessError> {
        self.ensure_running()?;

        let last = self.episode.saturating_sub(1);
        self.render(last)
            .inspect_err(|_| self.state = State::Failed)?;
        self.state = State::Done;

        emit(
            &mut self.sinks,
            Progress::Finished {
                episodes: self.episode,
                interactions: self.learner.interactions(),
            },
        );
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), HarnessError> {
        match self.state {
            State::Done => Err(HarnessError::Finished(self.config.episode_num)),
            State::Failed => Err(HarnessError::Aborted(self.episode)),
            _ => Ok(()),
        }
    }

    fn generate(&mut self) -> Result<Trajectory<E>, HarnessError> {
        let mut seats = seat_table(&mut self.agent, &mut self.opponents);
        let episode = self
            .env
            .run(&mut seats, Mode::Training)
            .map_err(HarnessError::environment)?;

        episode
            .into_trajectory(CONTROLLED_SEAT)
            .ok_or(HarnessError::MissingTrajectory(CONTROLLED_SEAT))
    }

    fn learn(&mut self, trajectory: Trajectory<E>) -> Result<LearnSummary, HarnessError> {
        let sinks = &mut self.sinks;
        self.learner
            .learn(&mut self.agent, trajectory, |step, loss| {
                emit(sinks, Progress::Step { step, loss })
            })
            .map_err(HarnessError::agent)
    }

    fn maybe_evaluate(&mut self, episode: u64) -> Result<Option<Point>, HarnessError> {
        let mut seats = seat_table(&mut self.agent, &mut self.opponents);
        let Some(reward) = self
            .evaluation
            .maybe_evaluate(episode, &mut self.eval_env, &mut seats)?
        else {
            return Ok(None);
        };

        let timestep = self.learner.interactions();
        self.recorder.log_line("########## Evaluation ##########")?;
        self.recorder
            .log_line(format!("Timestep: {timestep} Average reward is {reward}"))?;
        self.recorder.add_point(timestep, reward)?;

        emit(
            &mut self.sinks,
            Progress::Evaluation {
                episode,
                timestep,
                reward,
            },
        );
        Ok(Some(Point {
            x: timestep,
            y: reward,
        }))
    }

    fn render(&mut self, episode: u64) -> Result<PathBuf, HarnessError> {
        let path = self.figure_path(episode);
        self.recorder.render(&path)?;
        info!("rendered learning curve to {}", path.display());

        emit(
            &mut self.sinks,
            Progress::Plot {
                episode,
                path: path.clone(),
            },
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        agent::RandomAgent,
        env::tests::MockEnv,
        harness::{learner::tests::RecordingAgent, recorder::tests::SpyPlotter},
        plot::Labels,
    };

    use super::*;

    fn harness(
        config: HarnessConfig,
        env: MockEnv,
        eval_env: MockEnv,
        spy: &SpyPlotter,
    ) -> Harness<MockEnv, RecordingAgent> {
        let recorder = MetricRecorder::new(Labels::new("timestep", "reward", "mock"))
            .with_plotter(spy.clone());
        Harness::new(
            config,
            env,
            eval_env,
            RecordingAgent::default(),
            vec![Box::new(RandomAgent::new())],
            recorder,
        )
        .unwrap()
    }

    fn config(episodes: u64) -> HarnessConfig {
        HarnessConfig::new()
            .with_episode_num(episodes)
            .with_evaluate_every(1)
            .with_evaluate_num(2)
            .with_save_plot_every(1)
            .with_memory_init_size(0)
            .with_norm_step(0)
    }

    #[test]
    fn rejects_invalid_config_before_playing() {
        let spy = SpyPlotter::default();
        let recorder = MetricRecorder::new(Labels::new("x", "y", "l")).with_plotter(spy);
        let result = Harness::new(
            config(3).with_evaluate_num(0),
            MockEnv::new(3, vec![1.0]),
            MockEnv::new(3, vec![1.0]),
            RecordingAgent::default(),
            vec![Box::new(RandomAgent::new())],
            recorder,
        );
        assert!(matches!(
            result,
            Err(HarnessError::Config(ConfigError::Zero("evaluate_num")))
        ));
    }

    #[test]
    fn rejects_seat_mismatch() {
        let recorder = MetricRecorder::new(Labels::new("x", "y", "l"));
        let result = Harness::<MockEnv, _>::new(
            config(3),
            MockEnv::new(3, vec![1.0]),
            MockEnv::new(3, vec![1.0]),
            RecordingAgent::default(),
            Vec::new(),
            recorder,
        );
        assert!(matches!(
            result,
            Err(HarnessError::Config(ConfigError::SeatMismatch {
                which: "training",
                expected: 2,
                given: 1
            }))
        ));
    }

    #[test]
    fn first_episode_evaluates_but_does_not_plot() {
        let spy = SpyPlotter::default();
        let mut harness = harness(
            config(2),
            MockEnv::new(3, vec![1.0]),
            MockEnv::new(1, vec![2.0, -2.0]),
            &spy,
        );

        let first = harness.step_episode().unwrap();
        assert_eq!(harness.interactions(), 3);
        assert_eq!(first.evaluation, Some(Point { x: 3, y: 0.0 }));
        assert_eq!(first.plot, None, "episode 0 never plots");
        assert_eq!(harness.recorder().points().len(), 1);
        assert_eq!(
            harness.recorder().lines(),
            [
                "########## Evaluation ##########",
                "Timestep: 3 Average reward is 0"
            ]
        );
        assert_eq!(harness.state(), State::Idle);

        let second = harness.step_episode().unwrap();
        assert_eq!(second.plot, Some(harness.figure_path(1)));
        assert_eq!(spy.renders.borrow().len(), 1);
    }

    #[test]
    fn evaluation_leaves_counter_and_training_env_alone() {
        let spy = SpyPlotter::default();
        let mut harness = harness(
            config(4),
            MockEnv::new(2, vec![1.0]),
            MockEnv::new(5, vec![1.0]),
            &spy,
        );

        for episode in 0..4u64 {
            harness.step_episode().unwrap();
            assert_eq!(harness.interactions(), 2 * (episode + 1));
        }
        assert_eq!(harness.env().training_runs, 4);
        assert_eq!(harness.env().evaluation_runs, 0);
        assert_eq!(harness.eval_env().training_runs, 0);
        assert_eq!(harness.eval_env().evaluation_runs, 8);
        assert_eq!(harness.agent().memorized.len(), 8, "only training interactions memorized");
    }

    #[test]
    fn finishing_renders_once_more_and_stops() {
        let spy = SpyPlotter::default();
        let mut harness = harness(
            config(3).with_save_plot_every(2),
            MockEnv::new(1, vec![1.0]),
            MockEnv::new(1, vec![1.0]),
            &spy,
        );
        let events = harness.subscribe();

        harness.run().unwrap();
        assert_eq!(harness.state(), State::Done);
        assert!(matches!(harness.step_episode(), Err(HarnessError::Finished(3))));
        assert!(matches!(harness.finish(), Err(HarnessError::Finished(3))));

        let renders: Vec<PathBuf> = spy.renders.borrow().iter().map(|r| r.0.clone()).collect();
        assert_eq!(renders, [harness.figure_path(2), harness.figure_path(2)]);

        let events: Vec<Progress> = events.try_iter().collect();
        assert_eq!(
            events.last(),
            Some(&Progress::Finished {
                episodes: 3,
                interactions: 3
            })
        );
        let ends = events
            .iter()
            .filter(|e| matches!(e, Progress::EpisodeEnd { .. }))
            .count();
        assert_eq!(ends, 3);
    }

    #[test]
    fn environment_failure_is_fatal() {
        let spy = SpyPlotter::default();
        let mut env = MockEnv::new(1, vec![1.0]);
        env.fail_on_training_run = Some(1);
        let mut harness = harness(config(5), env, MockEnv::new(1, vec![1.0]), &spy);

        let err = harness.run().unwrap_err();
        assert!(matches!(err, HarnessError::Environment(_)));
        assert_eq!(err.to_string(), "environment failed");
        assert_eq!(harness.episode(), 1, "stopped at the failing episode");
        assert_eq!(harness.state(), State::Failed);
        assert!(spy.renders.borrow().is_empty(), "no final render after a failure");
        assert!(matches!(harness.finish(), Err(HarnessError::Aborted(1))));
        assert!(spy.renders.borrow().is_empty());
    }

    #[test]
    fn agent_failure_is_fatal() {
        let spy = SpyPlotter::default();
        let mut harness = harness(
            config(5),
            MockEnv::new(1, vec![1.0]),
            MockEnv::new(1, vec![1.0]),
            &spy,
        );
        harness.agent_mut().fail_on_optimize = true;

        let err = harness.step_episode().unwrap_err();
        assert!(matches!(err, HarnessError::Agent(_)));
        assert_eq!(harness.interactions(), 1);
        assert_eq!(harness.state(), State::Failed);
    }

    #[test]
    fn no_episode_runs_after_a_failure() {
        let spy = SpyPlotter::default();
        let mut harness = harness(
            config(5),
            MockEnv::new(3, vec![1.0]),
            MockEnv::new(1, vec![1.0]),
            &spy,
        );
        harness.agent_mut().fail_on_optimize = true;
        assert!(harness.step_episode().is_err());

        harness.agent_mut().fail_on_optimize = false;
        assert!(matches!(harness.step_episode(), Err(HarnessError::Aborted(0))));
        assert!(matches!(harness.finish(), Err(HarnessError::Aborted(0))));
        assert!(matches!(harness.run(), Err(HarnessError::Aborted(0))));

        assert_eq!(harness.episode(), 0);
        assert_eq!(harness.interactions(), 1, "no interactions after the failure");
        assert!(harness.recorder().points().is_empty(), "episode 0 is never evaluated");
        assert!(spy.renders.borrow().is_empty());
    }

    #[test]
    fn render_failure_is_fatal() {
        let spy = SpyPlotter {
            fail: true,
            ..Default::default()
        };
        let mut harness = harness(
            config(2),
            MockEnv::new(1, vec![1.0]),
            MockEnv::new(1, vec![1.0]),
            &spy,
        );

        harness.step_episode().unwrap();
        let err = harness.step_episode().unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Recorder(RecorderError::Plot { .. })
        ));
    }

    #[test]
    fn dropped_subscriber_is_unsubscribed() {
        let spy = SpyPlotter::default();
        let mut harness = harness(
            config(2),
            MockEnv::new(1, vec![1.0]),
            MockEnv::new(1, vec![1.0]),
            &spy,
        );
        drop(harness.subscribe());

        harness.step_episode().unwrap();
        assert!(harness.sinks.is_empty());
    }
}
