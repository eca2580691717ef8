//! NAF agent implemented with candle.
use super::{config::NafConfig, model::NafModel, noise::OuNoise};
use crate::util::{actions_to_tensor, states_to_tensor, track};
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::loss::mse;
use log::trace;
use naflab_core::{
    record::{Record, RecordValue},
    replay_buffer::{ReplayBuffer, Transition},
    Action, Agent, ExperienceBufferBase, Policy, ReplayBufferBase, State,
};
use ndarray::Array1;
use std::{fs, path::Path};

/// Normalized advantage function agent.
///
/// The agent owns its replay memory. Each call of [`Agent::fit`] appends a
/// transition and, once the memory holds a batch, takes
/// `n_updates_per_opt` gradient steps on the squared TD error
///
/// ```text
/// (r + gamma (1 - done) V_tgt(s') - Q(s, a))^2
/// ```
///
/// The target network tracks the online network every
/// `soft_update_interval` optimization steps.
pub struct Naf {
    model: NafModel,
    model_tgt: NafModel,
    memory: ReplayBuffer<State, Action>,
    noise: OuNoise,
    action_min: Array1<f64>,
    action_max: Array1<f64>,
    gamma: f64,
    batch_size: usize,
    n_updates_per_opt: usize,
    soft_update_interval: usize,
    soft_update_counter: usize,
    tau: f64,
    train: bool,
    device: Device,
    n_opts: usize,
}

impl Naf {
    /// Constructs NAF agent.
    pub fn build(config: NafConfig) -> Result<Self> {
        let device: Device = config.device.unwrap_or(crate::Device::Cpu).try_into()?;
        let model_config = config.model_config;
        let action_min = Array1::from(model_config.action_min.clone());
        let action_max = Array1::from(model_config.action_max.clone());
        let noise = OuNoise::new(config.noise_config, model_config.action_dim);
        let model = NafModel::build(model_config, device.clone())?;
        let model_tgt = model.try_clone()?;

        Ok(Self {
            model,
            model_tgt,
            memory: ReplayBuffer::build(&config.replay_buffer_config),
            noise,
            action_min,
            action_max,
            gamma: config.gamma,
            batch_size: config.batch_size.max(1),
            n_updates_per_opt: config.n_updates_per_opt,
            soft_update_interval: config.soft_update_interval.max(1),
            soft_update_counter: 0,
            tau: config.tau,
            train: config.train,
            device,
            n_opts: 0,
        })
    }

    /// Returns the function approximator.
    pub fn model(&self) -> &NafModel {
        &self.model
    }

    /// Returns the current noise threshold.
    pub fn noise_threshold(&self) -> f64 {
        self.noise.threshold()
    }

    /// Overrides the noise threshold, `0` disables exploration.
    pub fn set_noise_threshold(&mut self, threshold: f64) {
        self.noise.set_threshold(threshold);
    }

    /// Changes `dt` of the reward-based advantage of both networks.
    pub fn set_dt(&mut self, dt: f64) {
        self.model.set_dt(dt);
        self.model_tgt.set_dt(dt);
    }

    /// Removes all transitions from the replay memory.
    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    /// Returns the number of optimization steps taken so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    fn action(&mut self, obs: &State) -> Result<Action> {
        let obs = states_to_tensor(std::slice::from_ref(obs), &self.device)?;
        let mu = self.model.mu(&obs)?.squeeze(0)?.to_vec1::<f32>()?;
        let mut a = mu.iter().map(|&x| x as f64).collect::<Array1<f64>>();

        if self.train {
            a = a + Array1::from(self.noise.sample()?);
        }

        Ok(Action::new(a).clip(&self.action_min, &self.action_max))
    }

    fn update(&mut self) -> Result<f32> {
        let batch = self.memory.batch(self.batch_size)?;
        let n = batch.len();
        let (obs, act, next_obs, reward, is_done) = batch.unpack();
        let obs = states_to_tensor(&obs, &self.device)?;
        let act = actions_to_tensor(&act, &self.device)?;
        let next_obs = states_to_tensor(&next_obs, &self.device)?;
        let reward = Tensor::from_vec(reward, n, &self.device)?;
        let is_not_done = {
            let is_not_done = is_done.into_iter().map(|v| (1 - v) as f32).collect::<Vec<_>>();
            Tensor::from_vec(is_not_done, n, &self.device)?
        };

        let tgt = {
            let v = self.model_tgt.value(&next_obs)?;
            (reward + (is_not_done * self.gamma)?.mul(&v)?)?.detach()
        };
        let pred = self.model.q(&obs, &act)?;
        let loss = mse(&pred, &tgt)?;

        // Backprop
        self.model.backward_step(&loss)?;

        Ok(loss.to_scalar::<f32>()?)
    }

    fn opt_(&mut self) -> Result<Record> {
        let mut loss = 0f32;

        for _ in 0..self.n_updates_per_opt {
            loss += self.update()?;
        }

        self.soft_update_counter += 1;
        if self.soft_update_counter == self.soft_update_interval {
            self.soft_update_counter = 0;
            track(self.model_tgt.get_varmap(), self.model.get_varmap(), self.tau)?;
        }

        loss /= self.n_updates_per_opt.max(1) as f32;
        self.n_opts += 1;
        trace!("n_opts={} loss={}", self.n_opts, loss);

        Ok(Record::from_scalar("loss", loss))
    }
}

impl Policy<State, Action> for Naf {
    /// Mean action, plus the exploration noise in training mode, clipped into
    /// the action bounds.
    fn sample(&mut self, obs: &State) -> Action {
        match self.action(obs) {
            Ok(a) => a,
            Err(e) => panic!("Failed to compute the action of NAF agent: {}", e),
        }
    }
}

impl Agent<State, Action> for Naf {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn push(&mut self, transition: Transition<State, Action>) -> Result<()> {
        self.memory.push(transition)
    }

    fn memory_len(&self) -> usize {
        self.memory.len()
    }

    fn opt_with_record(&mut self) -> Result<Record> {
        let threshold = self.noise.threshold() as f32;
        let mut record =
            Record::from_slice(&[("noise_threshold", RecordValue::Scalar(threshold))]);

        if self.memory.len() >= self.batch_size {
            record.merge_inplace(self.opt_()?);
        }

        Ok(record)
    }

    /// Decays the noise threshold and restarts the noise process.
    fn end_episode(&mut self) {
        self.noise.decrease();
        self.noise.reset();
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.model.save(path.join("naf.safetensors"))?;
        self.model_tgt.save(path.join("naf_tgt.safetensors"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.model.load(path.join("naf.safetensors"))?;
        self.model_tgt.load(path.join("naf_tgt.safetensors"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naf::{AdvantageConfig, NafModelConfig, NoiseConfig};
    use naflab_core::replay_buffer::ReplayBufferConfig;
    use tempdir::TempDir;

    fn config(batch_size: usize, capacity: usize) -> NafConfig {
        let model_config = NafModelConfig::new(2, vec![-1.0], vec![1.0], vec![16]);
        NafConfig::new(model_config)
            .batch_size(batch_size)
            .replay_buffer_config(ReplayBufferConfig::default().capacity(capacity))
    }

    fn transition(x: f64, reward: f32) -> Transition<State, Action> {
        Transition {
            obs: State::from(vec![0.0, x]),
            act: Action::from(vec![x.sin()]),
            reward,
            is_done: x > 0.5,
            next_obs: State::from(vec![0.1, x]),
        }
    }

    #[test]
    fn test_fit_is_noop_below_batch_size() -> Result<()> {
        let mut agent = Naf::build(config(4, 100))?;
        for i in 0..3 {
            let record = agent.fit(transition(i as f64 * 0.1, 1.0))?;
            assert!(record.get_scalar("loss").is_err());
            assert_eq!(record.get_scalar("noise_threshold")?, 1.0);
        }
        assert_eq!(agent.n_opts(), 0);

        let record = agent.fit(transition(0.3, 1.0))?;
        assert!(record.get_scalar("loss")?.is_finite());
        assert_eq!(agent.n_opts(), 1);
        Ok(())
    }

    #[test]
    fn test_memory_is_bounded() -> Result<()> {
        let mut agent = Naf::build(config(2, 5))?;
        for i in 0..8 {
            agent.push(transition(i as f64, 0.0))?;
        }
        assert_eq!(agent.memory_len(), 5);

        agent.clear_memory();
        assert_eq!(agent.memory_len(), 0);
        Ok(())
    }

    #[test]
    fn test_loss_decreases_on_constant_target() -> Result<()> {
        let mut agent = Naf::build(config(16, 100).gamma(0.0))?;
        for i in 0..16 {
            agent.push(transition(i as f64 / 16.0, 1.0))?;
        }

        let first = agent.opt_with_record()?.get_scalar("loss")?;
        let mut last = first;
        for _ in 0..300 {
            last = agent.opt_with_record()?.get_scalar("loss")?;
        }
        assert!(last < first);
        Ok(())
    }

    #[test]
    fn test_actions_within_bounds() -> Result<()> {
        let config = config(1, 10).noise_config(NoiseConfig::default().ou_params(0.0, 0.15, 10.0));
        let mut agent = Naf::build(config)?;
        let obs = State::from(vec![0.0, 1.0]);
        for _ in 0..50 {
            let a = agent.sample(&obs)[0];
            assert!((-1.0..=1.0).contains(&a));
        }
        Ok(())
    }

    #[test]
    fn test_eval_mode_is_deterministic() -> Result<()> {
        let mut agent = Naf::build(config(1, 10))?;
        agent.eval();
        let obs = State::from(vec![0.0, 0.3]);
        let a = agent.sample(&obs);
        assert_eq!(agent.sample(&obs), a);

        // Zero threshold in training mode yields the mean action as well.
        agent.train();
        agent.set_noise_threshold(0.0);
        assert_eq!(agent.sample(&obs), a);
        Ok(())
    }

    #[test]
    fn test_end_episode_decays_noise() -> Result<()> {
        let noise_config = NoiseConfig::linear(1.0, 0.5, 0.2);
        let mut agent = Naf::build(config(1, 10).noise_config(noise_config))?;
        agent.end_episode();
        assert!((agent.noise_threshold() - 0.8).abs() < 1e-12);
        for _ in 0..5 {
            agent.end_episode();
        }
        assert_eq!(agent.noise_threshold(), 0.5);
        Ok(())
    }

    #[test]
    fn test_reward_based_set_dt() -> Result<()> {
        let model_config = NafModelConfig::new(4, vec![-1.0], vec![1.0], vec![8])
            .advantage(AdvantageConfig::RewardBased { r: 0.1, dt: 2.0 });
        let mut agent = Naf::build(NafConfig::new(model_config))?;
        agent.set_dt(0.5);
        assert_eq!(
            agent.model().config().advantage,
            AdvantageConfig::RewardBased { r: 0.1, dt: 0.5 }
        );
        Ok(())
    }

    #[test]
    fn test_save_and_load_params() -> Result<()> {
        let mut agent = Naf::build(config(1, 10))?;
        agent.eval();
        let dir = TempDir::new("naf")?;
        let path = dir.path().join("agent");
        agent.save_params(&path)?;
        assert!(path.join("naf.safetensors").exists());
        assert!(path.join("naf_tgt.safetensors").exists());

        let mut agent_ = Naf::build(config(1, 10))?;
        agent_.eval();
        agent_.load_params(&path)?;
        let obs = State::from(vec![0.0, 0.7]);
        assert_eq!(agent.sample(&obs), agent_.sample(&obs));
        Ok(())
    }
}
