//! Ornstein-Uhlenbeck exploration noise with a decaying threshold.
use anyhow::Result;
use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// How the threshold of [`OuNoise`] decreases at each [`OuNoise::decrease`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum NoiseDecay {
    /// `threshold <- threshold * ratio`.
    Geometric {
        /// Ratio, typically in `(0, 1)`.
        ratio: f64,
    },

    /// `threshold <- threshold - decrement`.
    Linear {
        /// Decrement.
        decrement: f64,
    },
}

/// Configuration of [`OuNoise`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct NoiseConfig {
    /// Mean of the process.
    pub mu: f64,

    /// Rate of reversion to the mean.
    pub theta: f64,

    /// Scale of the Gaussian increments.
    pub sigma: f64,

    /// Initial threshold.
    pub threshold: f64,

    /// Floor of the threshold.
    pub threshold_min: f64,

    /// Decay law of the threshold.
    pub decay: NoiseDecay,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            mu: 0.0,
            theta: 0.15,
            sigma: 0.3,
            threshold: 1.0,
            threshold_min: 0.01,
            decay: NoiseDecay::Geometric { ratio: 0.99 },
        }
    }
}

impl NoiseConfig {
    /// Geometric decay from `threshold` to `threshold_min` in `n` decreases.
    pub fn geometric_over(threshold: f64, threshold_min: f64, n: usize) -> Self {
        let ratio = (threshold_min / threshold).powf(1.0 / n.max(1) as f64);
        Self {
            threshold,
            threshold_min,
            decay: NoiseDecay::Geometric { ratio },
            ..Self::default()
        }
    }

    /// Linear decay by `decrement` per decrease.
    pub fn linear(threshold: f64, threshold_min: f64, decrement: f64) -> Self {
        Self {
            threshold,
            threshold_min,
            decay: NoiseDecay::Linear { decrement },
            ..Self::default()
        }
    }

    /// Sets the parameters of the Ornstein-Uhlenbeck process.
    pub fn ou_params(mut self, mu: f64, theta: f64, sigma: f64) -> Self {
        self.mu = mu;
        self.theta = theta;
        self.sigma = sigma;
        self
    }

    /// Constructs [`NoiseConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`NoiseConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Ornstein-Uhlenbeck process scaled by a threshold.
///
/// Each call of [`OuNoise::sample`] advances the per-dimension state
///
/// ```text
/// x <- x + theta (mu - x) + sigma N(0, 1)
/// ```
///
/// and returns `threshold * x`. The threshold only changes through
/// [`OuNoise::decrease`] and [`OuNoise::set_threshold`], and never goes
/// below `threshold_min` through the former.
pub struct OuNoise {
    config: NoiseConfig,
    state: Vec<f64>,
    threshold: f64,
}

impl OuNoise {
    /// Constructs the process of the given dimension.
    pub fn new(config: NoiseConfig, dim: usize) -> Self {
        Self {
            state: vec![config.mu; dim],
            threshold: config.threshold,
            config,
        }
    }

    /// Returns the current threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Overrides the threshold, for example to restart exploration.
    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    /// Resets the state of the process to its mean.
    pub fn reset(&mut self) {
        self.state.iter_mut().for_each(|x| *x = self.config.mu);
    }

    /// Advances the process and returns the scaled noise.
    pub fn sample(&mut self) -> Result<Vec<f64>> {
        let z = Tensor::randn(0f32, 1f32, self.state.len(), &Device::Cpu)?.to_vec1::<f32>()?;
        let NoiseConfig {
            mu, theta, sigma, ..
        } = self.config;

        Ok(self
            .state
            .iter_mut()
            .zip(z)
            .map(|(x, z)| {
                *x += theta * (mu - *x) + sigma * z as f64;
                self.threshold * *x
            })
            .collect())
    }

    /// Applies the decay law once, clamped at `threshold_min`.
    pub fn decrease(&mut self) {
        let threshold = match self.config.decay {
            NoiseDecay::Geometric { ratio } => self.threshold * ratio,
            NoiseDecay::Linear { decrement } => self.threshold - decrement,
        };
        self.threshold = threshold.max(self.config.threshold_min);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_geometric_decay() {
        let config = NoiseConfig::geometric_over(1.0, 0.01, 200);
        let mut noise = OuNoise::new(config, 1);
        for _ in 0..100 {
            noise.decrease();
        }
        assert!((noise.threshold() - 0.1).abs() < 1e-9);

        for _ in 0..150 {
            noise.decrease();
        }
        assert_eq!(noise.threshold(), 0.01);
    }

    #[test]
    fn test_linear_decay_floor() {
        let config = NoiseConfig::linear(1.0, 0.25, 0.2);
        let mut noise = OuNoise::new(config, 1);
        let mut thresholds = vec![];
        for _ in 0..5 {
            noise.decrease();
            thresholds.push(noise.threshold());
        }
        let expected = [0.8, 0.6, 0.4, 0.25, 0.25];
        for (t, e) in thresholds.iter().zip(expected.iter()) {
            assert!((t - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_threshold_is_silent() -> Result<()> {
        let mut noise = OuNoise::new(NoiseConfig::default(), 3);
        noise.set_threshold(0.0);
        for _ in 0..10 {
            assert!(noise.sample()?.iter().all(|x| *x == 0.0));
        }
        Ok(())
    }

    #[test]
    fn test_sample_dimension() -> Result<()> {
        let mut noise = OuNoise::new(NoiseConfig::default(), 2);
        assert_eq!(noise.sample()?.len(), 2);
        noise.reset();
        Ok(())
    }

    #[test]
    fn test_serde_noise_config() -> Result<()> {
        let config = NoiseConfig::linear(1.0, 1e-7, 2e-6);
        let dir = TempDir::new("noise_config")?;
        let path = dir.path().join("noise.yaml");
        config.save(&path)?;
        assert_eq!(NoiseConfig::load(&path)?, config);
        Ok(())
    }
}
