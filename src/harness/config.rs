use burn::prelude::*;

use super::ConfigError;

/// Cadences and warm-up sizes of a harness run
///
/// The defaults are those of a long Limit Hold'em DQN experiment.
#[derive(Config, Debug)]
pub struct HarnessConfig {
    /// Number of training episodes to play
    #[config(default = 1000000)]
    pub episode_num: u64,
    /// Evaluate every this many episodes, starting with episode 0
    #[config(default = 100)]
    pub evaluate_every: u64,
    /// Number of evaluation episodes averaged into one point of the learning curve
    #[config(default = 10000)]
    pub evaluate_num: u64,
    /// Render the learning curve every this many episodes, skipping episode 0
    #[config(default = 1000)]
    pub save_plot_every: u64,
    /// Interactions to collect before the first optimization step
    #[config(default = 1000)]
    pub memory_init_size: u64,
    /// Interactions reserved for collecting state normalization statistics
    #[config(default = 100)]
    pub norm_step: u64,
}

impl HarnessConfig {
    /// Check every value the loop divides by or counts to
    pub fn validate(&self) -> Result<(), ConfigError> {
        let counts = [
            ("episode_num", self.episode_num),
            ("evaluate_every", self.evaluate_every),
            ("evaluate_num", self.evaluate_num),
            ("save_plot_every", self.save_plot_every),
        ];
        match counts.into_iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ConfigError::Zero(name)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = HarnessConfig::new();
        assert_eq!(config.evaluate_every, 100);
        assert_eq!(config.save_plot_every, 1000);
        assert_eq!(config.evaluate_num, 10000);
        assert_eq!(config.memory_init_size, 1000);
        assert_eq!(config.norm_step, 100);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn zero_evaluation_count_is_rejected() {
        let config = HarnessConfig::new().with_evaluate_num(0);
        assert_eq!(config.validate(), Err(ConfigError::Zero("evaluate_num")));

        let config = HarnessConfig::new().with_save_plot_every(0);
        assert_eq!(config.validate(), Err(ConfigError::Zero("save_plot_every")));
    }

    #[test]
    fn round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.json");
        let config = HarnessConfig::new().with_episode_num(12).with_norm_step(3);
        config.save(&path).unwrap();

        let loaded = HarnessConfig::load(&path).unwrap();
        assert_eq!(loaded.episode_num, 12);
        assert_eq!(loaded.norm_step, 3);
    }
}
