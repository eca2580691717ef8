//! Configuration of [`Trainer`](super::Trainer) and [`GameTrainer`](super::GameTrainer).
use super::RewardSign;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer) and [`GameTrainer`](super::GameTrainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of training episodes.
    pub n_episodes: usize,

    /// The maximum number of environment steps in an episode.
    ///
    /// An episode reaching this cap is truncated; its last transition is
    /// stored as not done.
    pub max_steps_per_episode: usize,

    /// Sign applied to environment rewards before they are handed to the agent.
    pub reward_sign: RewardSign,

    /// The number of episodes preceding the current one over which the mean
    /// reward is computed.
    pub mean_window: usize,

    /// The number of steps after which the updating player switches in
    /// alternating two-agent training.
    pub block_len: usize,

    /// Where to save the trained model.
    pub model_dir: Option<String>,

    /// Interval of saving model parameters in episodes.
    pub save_interval: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_episodes: 0,
            max_steps_per_episode: usize::MAX,
            reward_sign: RewardSign::Keep,
            mean_window: 25,
            block_len: 100,
            model_dir: None,
            save_interval: usize::MAX,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of training episodes.
    pub fn n_episodes(mut self, v: usize) -> Self {
        self.n_episodes = v;
        self
    }

    /// Sets the maximum number of steps in an episode.
    pub fn max_steps_per_episode(mut self, v: usize) -> Self {
        self.max_steps_per_episode = v;
        self
    }

    /// Sets the sign applied to rewards before fitting.
    pub fn reward_sign(mut self, v: RewardSign) -> Self {
        self.reward_sign = v;
        self
    }

    /// Sets the window of the running mean of episode rewards.
    pub fn mean_window(mut self, v: usize) -> Self {
        self.mean_window = v;
        self
    }

    /// Sets the length of the blocks of alternating updates.
    pub fn block_len(mut self, v: usize) -> Self {
        self.block_len = v;
        self
    }

    /// Sets the directory where model parameters are saved.
    pub fn model_dir(mut self, model_dir: impl Into<String>) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Sets the interval of saving in episodes.
    pub fn save_interval(mut self, v: usize) -> Self {
        self.save_interval = v;
        self
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .n_episodes(300)
            .max_steps_per_episode(2000)
            .reward_sign(RewardSign::Negate)
            .mean_window(50)
            .model_dir("some/directory");

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");

        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
