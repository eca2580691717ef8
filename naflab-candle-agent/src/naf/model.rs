//! Function approximator of NAF.
use crate::{
    mlp::{Mlp, MlpConfig},
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::track,
    Activation,
};
use anyhow::{bail, Result};
use naflab_core::error::NaflabError;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// The advantage term of [`NafModel`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum AdvantageConfig {
    /// `A(s, a) = -1/2 (a - mu)^T P (a - mu)` with `P = L L^T` learned.
    ///
    /// The network outputs the `action_dim^2` entries of `L`, of which the
    /// lower triangle is used, with exponentiated diagonal.
    Learned {
        /// Sizes of the hidden layers of the network of `L`.
        units: Vec<usize>,
    },

    /// `A(s, a) = -r dt |a - mu|^2`, the curvature given by the running cost.
    RewardBased {
        /// Coefficient of the running cost of the action.
        r: f64,

        /// Length of a step of the environment.
        dt: f64,
    },
}

/// Configuration of [`NafModel`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct NafModelConfig {
    /// Dimension of the state.
    pub state_dim: usize,

    /// Dimension of the action.
    pub action_dim: usize,

    /// Lower bounds of the action.
    pub action_min: Vec<f64>,

    /// Upper bounds of the action.
    pub action_max: Vec<f64>,

    /// Sizes of the hidden layers of the mean-action network.
    pub mu_units: Vec<usize>,

    /// Sizes of the hidden layers of the value network.
    pub v_units: Vec<usize>,

    /// Advantage term.
    pub advantage: AdvantageConfig,

    /// Optimizer.
    pub opt_config: OptimizerConfig,
}

impl NafModelConfig {
    /// Configuration with learned advantage, all networks sharing `units`.
    pub fn new(
        state_dim: usize,
        action_min: Vec<f64>,
        action_max: Vec<f64>,
        units: Vec<usize>,
    ) -> Self {
        Self {
            state_dim,
            action_dim: action_min.len(),
            action_min,
            action_max,
            mu_units: units.clone(),
            v_units: units.clone(),
            advantage: AdvantageConfig::Learned { units },
            opt_config: OptimizerConfig::default(),
        }
    }

    /// Sets the advantage term.
    pub fn advantage(mut self, v: AdvantageConfig) -> Self {
        self.advantage = v;
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`NafModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`NafModelConfig`] to as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Maps the output of the mean-action network into the action bounds.
///
/// `None` when some bound is infinite; the output is then used as is.
struct Squash {
    mid: Tensor,
    half_range: Tensor,
}

impl Squash {
    fn build(config: &NafModelConfig, device: &Device) -> Result<Option<Self>> {
        let bounds = config.action_min.iter().zip(config.action_max.iter());
        if bounds.clone().any(|(lo, hi)| !lo.is_finite() || !hi.is_finite()) {
            return Ok(None);
        }
        let mid = bounds.clone().map(|(lo, hi)| ((lo + hi) / 2.0) as f32);
        let half = bounds.map(|(lo, hi)| ((hi - lo) / 2.0) as f32);
        let n = config.action_dim;

        Ok(Some(Self {
            mid: Tensor::from_iter(mid, device)?.reshape((1, n))?,
            half_range: Tensor::from_iter(half, device)?.reshape((1, n))?,
        }))
    }
}

/// Value, mean action and advantage of NAF, `Q(s, a) = V(s) + A(s, a)`.
///
/// All networks share a single [`VarMap`], under the prefixes `mu`, `v` and
/// `p`.
pub struct NafModel {
    device: Device,
    varmap: VarMap,
    config: NafModelConfig,
    mu: Mlp,
    v: Mlp,
    p: Option<Mlp>,
    squash: Option<Squash>,
    opt: Optimizer,
}

impl NafModel {
    /// Constructs [`NafModel`].
    pub fn build(config: NafModelConfig, device: Device) -> Result<Self> {
        Self::_build(config, device, None)
    }

    fn _build(config: NafModelConfig, device: Device, varmap_src: Option<&VarMap>) -> Result<Self> {
        if config.action_min.len() != config.action_dim
            || config.action_max.len() != config.action_dim
        {
            return Err(NaflabError::InvalidConfig(format!(
                "Action bounds of dimension {} and {} for action_dim {}",
                config.action_min.len(),
                config.action_max.len(),
                config.action_dim
            ))
            .into());
        }
        if let Some((lo, hi)) = config
            .action_min
            .iter()
            .zip(config.action_max.iter())
            .find(|(lo, hi)| lo > hi)
        {
            return Err(NaflabError::InvalidConfig(format!(
                "Lower action bound {} exceeds upper bound {}",
                lo, hi
            ))
            .into());
        }

        let varmap = VarMap::new();
        let squash = Squash::build(&config, &device)?;
        let (s_dim, a_dim) = (config.state_dim, config.action_dim);
        let (mu, v, p) = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            let mu_act = match squash {
                Some(_) => Activation::Tanh,
                None => Activation::None,
            };
            let mu_config = MlpConfig::new(s_dim, config.mu_units.clone(), a_dim, mu_act);
            let v_config = MlpConfig::new(s_dim, config.v_units.clone(), 1, Activation::None);
            let mu = Mlp::build(vb.pp("mu"), mu_config)?;
            let v = Mlp::build(vb.pp("v"), v_config)?;
            let p = match &config.advantage {
                AdvantageConfig::Learned { units } => {
                    let p_config =
                        MlpConfig::new(s_dim, units.clone(), a_dim * a_dim, Activation::None);
                    Some(Mlp::build(vb.pp("p"), p_config)?)
                }
                AdvantageConfig::RewardBased { .. } => None,
            };
            (mu, v, p)
        };

        // Optimizer
        let opt = config.opt_config.build(varmap.all_vars())?;

        // Copy varmap
        if let Some(varmap_src) = varmap_src {
            track(&varmap, varmap_src, 1.0)?;
        }

        Ok(Self {
            device,
            varmap,
            config,
            mu,
            v,
            p,
            squash,
            opt,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &NafModelConfig {
        &self.config
    }

    /// Returns the device.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Mean action of shape `[n, action_dim]`, within the action bounds if
    /// they are finite.
    pub fn mu(&self, obs: &Tensor) -> Result<Tensor> {
        let xs = self.mu.forward(obs)?;
        match &self.squash {
            Some(s) => Ok(xs.broadcast_mul(&s.half_range)?.broadcast_add(&s.mid)?),
            None => Ok(xs),
        }
    }

    /// State value of shape `[n]`.
    pub fn value(&self, obs: &Tensor) -> Result<Tensor> {
        Ok(self.v.forward(obs)?.squeeze(D::Minus1)?)
    }

    /// Advantage of shape `[n]`, never positive.
    pub fn advantage(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        let d = (act.to_device(&self.device)? - self.mu(obs)?)?;

        match (&self.config.advantage, &self.p) {
            (AdvantageConfig::RewardBased { r, dt }, _) => {
                Ok((d.sqr()?.sum(D::Minus1)? * (-r * dt))?)
            }
            (AdvantageConfig::Learned { .. }, Some(p)) => {
                let n = d.dims()[0];
                let a = self.config.action_dim;
                let l = self.lower_triangular(&p.forward(obs)?.reshape((n, a, a))?)?;
                let pm = l.matmul(&l.t()?.contiguous()?)?;
                let d = d.unsqueeze(D::Minus1)?;
                let quad = d.t()?.contiguous()?.matmul(&pm)?.matmul(&d)?;
                Ok((quad.reshape(n)? * -0.5)?)
            }
            (AdvantageConfig::Learned { .. }, None) => bail!("Network of L is not built"),
        }
    }

    /// Lower-triangular part of `raw` with exponentiated diagonal.
    fn lower_triangular(&self, raw: &Tensor) -> Result<Tensor> {
        let a = self.config.action_dim;
        let mask = |f: fn(usize, usize) -> bool| -> Result<Tensor> {
            let v = (0..a * a)
                .map(|ix| if f(ix / a, ix % a) { 1f32 } else { 0f32 })
                .collect::<Vec<_>>();
            Ok(Tensor::from_vec(v, (1, a, a), &self.device)?)
        };
        let strict = mask(|i, j| i > j)?;
        let diag = mask(|i, j| i == j)?;

        let off = raw.broadcast_mul(&strict)?;
        let on = raw.broadcast_mul(&diag)?.exp()?.broadcast_mul(&diag)?;
        Ok((off + on)?)
    }

    /// Action value `V(s) + A(s, a)` of shape `[n]`.
    pub fn q(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        Ok((self.value(obs)? + self.advantage(obs, act)?)?)
    }

    /// Changes `dt` of the reward-based advantage. No effect on a learned one.
    pub fn set_dt(&mut self, dt: f64) {
        if let AdvantageConfig::RewardBased { dt: dt_, .. } = &mut self.config.advantage {
            *dt_ = dt;
        }
    }

    /// Applies a backward step pass.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Returns the [`VarMap`] of the parameters.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters in safetensors format.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save NAF model to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters saved with [`NafModel::save`].
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load NAF model from {:?}", path.as_ref());
        Ok(())
    }

    /// Constructs a copy with its own parameters and optimizer state.
    pub fn try_clone(&self) -> Result<Self> {
        Self::_build(self.config.clone(), self.device.clone(), Some(&self.varmap))
    }
}
