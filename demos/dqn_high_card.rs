use std::{env, error::Error};

use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    config::Config,
};
use once_cell::sync::Lazy;
use rl_harness::{
    agent::{Policy, RandomAgent},
    algo::dqn::{adamw, DQNAgent, DQNAgentConfig},
    env::Environment,
    gym::HighCard,
    harness::{Harness, HarnessConfig, MetricRecorder},
    plot::Labels,
    viz,
};

type DQNBackend = Autodiff<NdArray>;

static DEVICE: Lazy<NdArrayDevice> = Lazy::new(NdArrayDevice::default);

const LOG_DIR: &str = "./experiments/high_card_dqn_result";

/// Trains a DQN agent at seat 0 of High Card against a random opponent
///
/// Pass the path of a saved [`HarnessConfig`] to override the default cadences.
fn main() -> Result<(), Box<dyn Error>> {
    let config = match env::args().nth(1) {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::new(),
    };

    let env = HighCard::default();
    let eval_env = HighCard::default();

    let agent_config = DQNAgentConfig::new("dqn".into(), env.num_actions(), env.state_shape())
        .with_replay_memory_size(100_000)
        .with_replay_memory_init_size(config.memory_init_size as usize)
        .with_norm_step(config.norm_step as usize)
        .with_mlp_layers(vec![512, 512]);
    let agent = DQNAgent::<DQNBackend, HighCard, _>::new(&agent_config, adamw(), &*DEVICE)?;
    agent.check_env(&env)?;
    let opponents: Vec<Box<dyn Policy<HighCard>>> = vec![Box::new(RandomAgent::new())];

    let recorder = MetricRecorder::new(Labels::new("timestep", "reward", "DQN on High Card"))
        .with_log_path(format!("{LOG_DIR}/log.txt"))?
        .with_csv_path(format!("{LOG_DIR}/performance.csv"))?;

    let (handle, tx) = viz::init(config.episode_num);

    let mut harness = Harness::new(config, env, eval_env, agent, opponents, recorder)?
        .with_figure_dir(format!("{LOG_DIR}/figures"));
    harness.add_sink(tx);

    let result = harness.run();
    drop(harness);
    let _ = handle.join();

    Ok(result?)
}
