//! Configuration of NAF agent.
use super::{noise::NoiseConfig, NafModelConfig};
use crate::Device;
use anyhow::Result;
use log::info;
use naflab_core::replay_buffer::ReplayBufferConfig;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Naf`](super::Naf).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct NafConfig {
    /// Configuration of the function approximator.
    pub model_config: NafModelConfig,

    /// Configuration of the exploration noise.
    pub noise_config: NoiseConfig,

    /// Configuration of the replay memory.
    pub replay_buffer_config: ReplayBufferConfig,

    /// Discount factor.
    pub gamma: f64,

    /// Batch size for training.
    pub batch_size: usize,

    /// Number of parameter updates per optimization step.
    pub n_updates_per_opt: usize,

    /// Interval of target tracking in optimization steps.
    pub soft_update_interval: usize,

    /// Coefficient of target tracking, `1` for a hard copy.
    pub tau: f64,

    /// Device of the networks. CPU if not given.
    pub device: Option<Device>,

    /// Starts in training mode.
    pub train: bool,
}

impl NafConfig {
    /// Constructs a configuration with default hyperparameters.
    pub fn new(model_config: NafModelConfig) -> Self {
        Self {
            model_config,
            noise_config: NoiseConfig::default(),
            replay_buffer_config: ReplayBufferConfig::default(),
            gamma: 1.0,
            batch_size: 128,
            n_updates_per_opt: 1,
            soft_update_interval: 1,
            tau: 1e-3,
            device: None,
            train: true,
        }
    }

    /// Sets the configuration of the exploration noise.
    pub fn noise_config(mut self, v: NoiseConfig) -> Self {
        self.noise_config = v;
        self
    }

    /// Sets the configuration of the replay memory.
    pub fn replay_buffer_config(mut self, v: ReplayBufferConfig) -> Self {
        self.replay_buffer_config = v;
        self
    }

    /// Discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the numper of parameter update steps per optimization step.
    pub fn n_updates_per_opt(mut self, v: usize) -> Self {
        self.n_updates_per_opt = v;
        self
    }

    /// Interval of target tracking.
    pub fn soft_update_interval(mut self, v: usize) -> Self {
        self.soft_update_interval = v;
        self
    }

    /// Coefficient of target tracking.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = Some(v);
        self
    }

    /// Constructs [`NafConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of NAF agent from {:?}", path_);
        Ok(b)
    }

    /// Saves [`NafConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of NAF agent into {:?}", path_);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naf::noise::NoiseDecay;
    use tempdir::TempDir;

    #[test]
    fn test_serde_naf_config() -> Result<()> {
        let model_config = NafModelConfig::new(2, vec![-1.0], vec![1.0], vec![16, 16]);
        let config = NafConfig::new(model_config)
            .noise_config(NoiseConfig::linear(1.0, 1e-7, 2e-6))
            .replay_buffer_config(ReplayBufferConfig::default().capacity(1000))
            .batch_size(64)
            .device(Device::Cpu);
        let dir = TempDir::new("naf_config")?;
        let path = dir.path().join("naf.yaml");

        config.save(&path)?;
        let config_ = NafConfig::load(&path)?;
        assert_eq!(config_, config);
        assert_eq!(
            config_.noise_config.decay,
            NoiseDecay::Linear { decrement: 2e-6 }
        );
        Ok(())
    }
}
