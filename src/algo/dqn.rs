mod model;

pub use model::QNetwork;

use burn::{
    nn::loss::{MseLoss, Reduction},
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use log::error;
use rand::{seq::SliceRandom, thread_rng};
use thiserror::Error;

use crate::{
    agent::{Agent, Policy},
    decay::{self, DecayError},
    env::Environment,
    exploration::{Choice, EpsilonGreedy},
    memory::{Exp, Normalizer, ReplayMemory},
};

#[derive(Debug, Error, PartialEq)]
pub enum DQNError {
    #[error("`{0}` must be at least 1")]
    Zero(&'static str),
    #[error("`{name}` ({value}) is smaller than the batch size ({batch_size})")]
    BatchTooLarge {
        name: &'static str,
        value: usize,
        batch_size: usize,
    },
    #[error("epsilon must lie in [0, 1], got {0}")]
    Epsilon(f32),
    #[error("invalid epsilon schedule")]
    Decay(#[from] DecayError),
    #[error("only {available} interactions in replay memory, a batch needs {required}")]
    NotEnoughExperience { available: usize, required: usize },
    #[error("state has {actual} features, the network expects {expected}")]
    StateShape { expected: usize, actual: usize },
    #[error("environment has {actual} actions, the network expects {expected}")]
    ActionCount { expected: usize, actual: usize },
}

/// Configuration for the [`DQNAgent`]
///
/// The compute device is passed to [`DQNAgent::new`] separately.
#[derive(Config, Debug)]
pub struct DQNAgentConfig {
    /// Name identifying the agent in logs
    pub scope: String,
    /// Size of the discrete action space
    pub num_actions: usize,
    /// Shape of one state, flattened before entering the network
    pub state_shape: Vec<usize>,
    /// Capacity of the replay memory
    #[config(default = 20000)]
    pub replay_memory_size: usize,
    /// Interactions stored before the first optimization step
    #[config(default = 100)]
    pub replay_memory_init_size: usize,
    /// Leading interactions only used to gather state normalization statistics
    #[config(default = 100)]
    pub norm_step: usize,
    /// Widths of the hidden layers
    #[config(default = "vec![512, 512]")]
    pub mlp_layers: Vec<usize>,
    #[config(default = 32)]
    pub batch_size: usize,
    /// The discount factor
    #[config(default = 0.99)]
    pub gamma: f32,
    /// The rate at which the target network's parameters are soft updated with the policy network's parameters
    #[config(default = 5e-3)]
    pub tau: f32,
    /// The learning rate for the optimizer
    #[config(default = 5e-5)]
    pub lr: f64,
    #[config(default = 1.0)]
    pub epsilon_start: f32,
    #[config(default = 0.1)]
    pub epsilon_end: f32,
    /// Memorized interactions over which epsilon decays linearly from start to end
    #[config(default = 20000)]
    pub epsilon_decay_steps: u64,
}

impl DQNAgentConfig {
    /// Number of features of a flattened state
    pub fn input_size(&self) -> usize {
        self.state_shape.iter().product()
    }

    pub fn validate(&self) -> Result<(), DQNError> {
        let sizes = [
            ("num_actions", self.num_actions),
            ("state_shape", self.input_size()),
            ("replay_memory_size", self.replay_memory_size),
            ("batch_size", self.batch_size),
        ];
        if let Some((name, _)) = sizes.into_iter().find(|(_, size)| *size == 0) {
            return Err(DQNError::Zero(name));
        }

        let batch_bounds = [
            ("replay_memory_size", self.replay_memory_size),
            ("replay_memory_init_size", self.replay_memory_init_size),
        ];
        if let Some((name, value)) = batch_bounds
            .into_iter()
            .find(|(_, value)| *value < self.batch_size)
        {
            return Err(DQNError::BatchTooLarge {
                name,
                value,
                batch_size: self.batch_size,
            });
        }

        for epsilon in [self.epsilon_start, self.epsilon_end] {
            if !(0.0..=1.0).contains(&epsilon) {
                return Err(DQNError::Epsilon(epsilon));
            }
        }

        Ok(())
    }
}

/// The AdamW optimizer with burn's default settings, ready to hand to [`DQNAgent::new`]
pub fn adamw<B: AutodiffBackend>() -> impl Optimizer<QNetwork<B>, B> {
    AdamWConfig::new().init::<B, QNetwork<B>>()
}

/// A Deep Q Network agent
///
/// The first `norm_step` memorized interactions only feed a running state [`Normalizer`]; every later
/// one is stored in the replay memory. Each [`optimize`](Agent::optimize) call samples a batch of
/// normalized interactions, takes one step of `O` on the policy network and soft updates the target
/// network.
///
/// ### Generics
/// - `B`: A burn autodiff backend
/// - `E`: The [`Environment`] the agent plays in
///     - States must be viewable as a flat slice of `f32` features
///     - Actions must be cheap copies convertible to an index in `0..num_actions`
/// - `O`: The [`Optimizer`] of the policy network, usually [`adamw`]
pub struct DQNAgent<B, E, O>
where
    B: AutodiffBackend,
    E: Environment,
    O: Optimizer<QNetwork<B>, B>,
{
    scope: String,
    policy_net: QNetwork<B>,
    target_net: QNetwork<B>,
    optimizer: O,
    loss: MseLoss<B>,
    device: B::Device,
    memory: ReplayMemory<E>,
    normalizer: Normalizer,
    exploration: EpsilonGreedy<decay::Linear>,
    input_size: usize,
    num_actions: usize,
    norm_step: u64,
    batch_size: usize,
    gamma: f32,
    tau: f32,
    lr: f64,
    total_steps: u64,
    train_steps: u64,
}

impl<B, E, O> DQNAgent<B, E, O>
where
    B: AutodiffBackend,
    E: Environment,
    E::State: AsRef<[f32]>,
    E::Action: Copy + Into<usize>,
    O: Optimizer<QNetwork<B>, B>,
{
    /// Initialize a new `DQNAgent` with fresh networks on `device`
    pub fn new(config: &DQNAgentConfig, optimizer: O, device: &B::Device) -> Result<Self, DQNError> {
        config.validate()?;

        let input_size = config.input_size();
        let policy_net =
            QNetwork::init(input_size, &config.mlp_layers, config.num_actions, device);
        let target_net = policy_net.clone();
        let exploration = EpsilonGreedy::new(decay::Linear::over(
            config.epsilon_decay_steps,
            config.epsilon_start,
            config.epsilon_end,
        )?);

        Ok(Self {
            scope: config.scope.clone(),
            policy_net,
            target_net,
            optimizer,
            loss: MseLoss::new(),
            device: device.clone(),
            memory: ReplayMemory::new(config.replay_memory_size),
            normalizer: Normalizer::new(),
            exploration,
            input_size,
            num_actions: config.num_actions,
            norm_step: config.norm_step as u64,
            batch_size: config.batch_size,
            gamma: config.gamma,
            tau: config.tau,
            lr: config.lr,
            total_steps: 0,
            train_steps: 0,
        })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Interactions memorized so far, including those only used for normalization
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Optimization steps taken so far
    pub fn train_steps(&self) -> u64 {
        self.train_steps
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon(self.total_steps)
    }

    /// Q value of every action in `state`
    pub fn q_values(&self, state: &[f32]) -> Result<Vec<f32>, DQNError> {
        self.check_shape(state)?;
        let input = Tensor::<B, 2>::from_floats(
            Data::new(self.normalizer.normalize(state), Shape::new([1, self.input_size])),
            &self.device,
        );
        Ok(self
            .policy_net
            .forward(input)
            .into_data()
            .convert::<f32>()
            .value)
    }

    fn check_shape(&self, state: &[f32]) -> Result<(), DQNError> {
        if state.len() == self.input_size {
            Ok(())
        } else {
            Err(DQNError::StateShape {
                expected: self.input_size,
                actual: state.len(),
            })
        }
    }

    /// Check that `env` produces the states and actions the networks were built for
    pub fn check_env(&self, env: &E) -> Result<(), DQNError> {
        let actual = env.state_shape().iter().product();
        if actual != self.input_size {
            return Err(DQNError::StateShape {
                expected: self.input_size,
                actual,
            });
        }
        if env.num_actions() != self.num_actions {
            return Err(DQNError::ActionCount {
                expected: self.num_actions,
                actual: env.num_actions(),
            });
        }
        Ok(())
    }

    /// The legal action with the highest Q value
    ///
    /// Refuses to act on a state the network cannot read, which the environment reports as a failure.
    fn greedy(&self, state: &E::State, legal: &[E::Action]) -> Option<E::Action> {
        let q = match self.q_values(state.as_ref()) {
            Ok(q) => q,
            Err(err) => {
                error!("[{}] {err}", self.scope);
                return None;
            }
        };
        let value = |a: &E::Action| q.get((*a).into()).copied().unwrap_or(f32::NEG_INFINITY);

        legal
            .iter()
            .copied()
            .max_by(|a, b| value(a).total_cmp(&value(b)))
    }

    /// Normalize and flatten a column of states into a `[rows, input_size]` tensor
    fn states_tensor<'a>(
        &self,
        states: impl IntoIterator<Item = &'a [f32]>,
        rows: usize,
    ) -> Result<Tensor<B, 2>, DQNError> {
        let mut values = Vec::with_capacity(rows * self.input_size);
        for state in states {
            self.check_shape(state)?;
            values.extend(self.normalizer.normalize(state));
        }
        Ok(Tensor::from_floats(
            Data::new(values, Shape::new([rows, self.input_size])),
            &self.device,
        ))
    }
}

impl<B, E, O> Policy<E> for DQNAgent<B, E, O>
where
    B: AutodiffBackend,
    E: Environment,
    E::State: AsRef<[f32]>,
    E::Action: Copy + Into<usize>,
    O: Optimizer<QNetwork<B>, B>,
{
    fn step(&mut self, state: &E::State, legal: &[E::Action]) -> Option<E::Action> {
        match self.exploration.choose(self.total_steps) {
            Choice::Explore => legal.choose(&mut thread_rng()).copied(),
            Choice::Exploit => self.greedy(state, legal),
        }
    }

    fn eval_step(&mut self, state: &E::State, legal: &[E::Action]) -> Option<E::Action> {
        self.greedy(state, legal)
    }
}

impl<B, E, O> Agent<E> for DQNAgent<B, E, O>
where
    B: AutodiffBackend,
    E: Environment,
    E::State: AsRef<[f32]>,
    E::Action: Copy + Into<usize>,
    O: Optimizer<QNetwork<B>, B>,
{
    type Error = DQNError;

    fn memorize(&mut self, exp: Exp<E>) {
        self.total_steps += 1;
        if self.total_steps <= self.norm_step {
            self.normalizer.observe(exp.state.as_ref());
        } else {
            self.memory.push(exp);
        }
    }

    fn optimize(&mut self) -> Result<f32, Self::Error> {
        let rows = self.batch_size;
        let batch = self
            .memory
            .sample_zipped(rows)
            .ok_or(DQNError::NotEnoughExperience {
                available: self.memory.len(),
                required: rows,
            })?;

        // Terminal next states are zero-filled and masked out of the bootstrap term
        let zeros = vec![0.0; self.input_size];
        let states = self.states_tensor(batch.states.iter().map(|state| state.as_ref()), rows)?;
        let next_states = self.states_tensor(
            batch
                .next_states
                .iter()
                .map(|next| next.as_ref().map_or(zeros.as_slice(), |state| state.as_ref())),
            rows,
        )?;
        let not_done = Tensor::<B, 2>::from_floats(
            Data::new(
                batch
                    .next_states
                    .iter()
                    .map(|s| if s.is_some() { 1.0 } else { 0.0 })
                    .collect::<Vec<f32>>(),
                Shape::new([rows, 1]),
            ),
            &self.device,
        );
        let actions = Tensor::<B, 2, Int>::from_ints(
            Data::new(
                batch
                    .actions
                    .iter()
                    .map(|&a| Into::<usize>::into(a) as i32)
                    .collect::<Vec<i32>>(),
                Shape::new([rows, 1]),
            ),
            &self.device,
        );
        let rewards = Tensor::<B, 2>::from_floats(
            Data::new(batch.rewards, Shape::new([rows, 1])),
            &self.device,
        );

        let policy_net = self.policy_net.clone();

        // Q values of the actions actually taken
        let q_values = policy_net.forward(states).gather(1, actions);

        // Best Q value reachable from each next state, according to the target network
        let max_next_q = self.target_net.forward(next_states).max_dim(1).detach();
        let expected = rewards + max_next_q * not_done * self.gamma;

        let loss = self.loss.forward(q_values, expected, Reduction::Mean);

        let grads = GradientsParams::from_grads(loss.backward(), &policy_net);
        self.policy_net = self.optimizer.step(self.lr, policy_net, grads);
        self.target_net = self
            .target_net
            .clone()
            .soft_update(&self.policy_net, self.tau);
        self.train_steps += 1;

        Ok(loss.into_scalar().elem::<f32>())
    }
}
