//! Pendulum swing-up with a terminal reward.
use crate::util::{load_yaml, reached, save_yaml, substep, to_array};
use anyhow::Result;
use log::trace;
use naflab_core::{Action, Env, State, Step};
use ndarray::{arr1, Array1};
use serde::{Deserialize, Serialize};
use std::{f64::consts::PI, path::Path};

/// Configuration of [`TerminalPendulum`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TerminalPendulumConfig {
    /// State `[t, θ, ω]` after reset.
    pub initial_state: Vec<f64>,

    /// Length of a step.
    pub dt: f64,

    /// The episode ends when the elapsed time reaches this value.
    pub terminal_time: f64,

    /// The number of Euler substeps in a step.
    pub inner_step_n: usize,

    /// Lower bound of the torque.
    pub action_min: Vec<f64>,

    /// Upper bound of the torque.
    pub action_max: Vec<f64>,

    /// Gravitational acceleration.
    pub gravity: f64,

    /// Coefficient of the running cost of the torque.
    pub r: f64,

    /// Mass.
    pub m: f64,

    /// Length.
    pub l: f64,
}

impl Default for TerminalPendulumConfig {
    fn default() -> Self {
        Self {
            initial_state: vec![0.0, PI, 0.0],
            dt: 0.2,
            terminal_time: 5.0,
            inner_step_n: 2,
            action_min: vec![-2.0],
            action_max: vec![2.0],
            gravity: 9.8,
            r: 0.05,
            m: 1.0,
            l: 1.0,
        }
    }
}

impl TerminalPendulumConfig {
    /// Sets the length of a step.
    pub fn dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Sets the terminal time.
    pub fn terminal_time(mut self, terminal_time: f64) -> Self {
        self.terminal_time = terminal_time;
        self
    }

    /// Sets the number of substeps.
    pub fn inner_step_n(mut self, inner_step_n: usize) -> Self {
        self.inner_step_n = inner_step_n;
        self
    }

    /// Sets the initial state.
    pub fn initial_state(mut self, initial_state: Vec<f64>) -> Self {
        self.initial_state = initial_state;
        self
    }

    /// Constructs [`TerminalPendulumConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_yaml(path)
    }

    /// Saves [`TerminalPendulumConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_yaml(self, path)
    }
}

/// A pendulum starting at the bottom, to be swung up by the end of the
/// episode.
///
/// The state is `[t, θ, ω]` where `θ = 0` is the upright position. The
/// dynamics are
///
/// ```text
/// t' = 1
/// θ' = ω
/// ω' = -3g / (2l) sin(θ + π) + 3 / (m l²) a
/// ```
///
/// Each non-terminal step pays the running reward `-r a² dt`. The step
/// reaching the terminal time pays only the terminal reward `-|θ| - 0.1|ω|`.
pub struct TerminalPendulum {
    config: TerminalPendulumConfig,
    action_min: Array1<f64>,
    action_max: Array1<f64>,
    inner_dt: f64,
    state: Array1<f64>,
}

impl TerminalPendulum {
    /// Dimension of the state.
    pub const STATE_DIM: usize = 3;

    /// Dimension of the action.
    pub const ACTION_DIM: usize = 1;

    /// Returns the configuration.
    pub fn config(&self) -> &TerminalPendulumConfig {
        &self.config
    }

    fn derivative(&self, state: &Array1<f64>, a: f64) -> Array1<f64> {
        let c = &self.config;
        arr1(&[
            1.0,
            state[2],
            -3.0 * c.gravity / (2.0 * c.l) * (state[1] + PI).sin() + 3.0 / (c.m * c.l * c.l) * a,
        ])
    }
}

impl Env for TerminalPendulum {
    type Config = TerminalPendulumConfig;
    type Obs = State;
    type Act = Action;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            action_min: to_array(&config.action_min),
            action_max: to_array(&config.action_max),
            inner_dt: substep(config.dt, config.inner_step_n)?,
            state: to_array(&config.initial_state),
        })
    }

    fn reset(&mut self) -> Result<State> {
        self.state = to_array(&self.config.initial_state);
        Ok(State::new(self.state.clone()))
    }

    fn step(&mut self, a: &Action) -> Step<State> {
        let a = a.clip(&self.action_min, &self.action_max)[0];

        for _ in 0..self.config.inner_step_n {
            let ds = self.derivative(&self.state, a);
            self.state = &self.state + &(ds * self.inner_dt);
        }

        let is_done = reached(self.state[0], self.config.terminal_time, self.inner_dt);
        let reward = if is_done {
            -self.state[1].abs() - 0.1 * self.state[2].abs()
        } else {
            -self.config.r * a * a * self.config.dt
        };
        trace!("state={:?} reward={} is_done={}", self.state, reward, is_done);

        Step::new(State::new(self.state.clone()), reward as f32, is_done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn build() -> TerminalPendulum {
        TerminalPendulum::build(&TerminalPendulumConfig::default(), 0).unwrap()
    }

    #[test]
    fn test_first_step() -> Result<()> {
        let mut env = build();
        let s0 = env.reset()?;
        assert_eq!(s0, State::from(vec![0.0, PI, 0.0]));

        let step = env.step(&Action::from(vec![0.0]));
        assert!((step.obs[0] - 0.2).abs() < 1e-12);
        assert!(!step.is_done());
        assert_eq!(step.reward, 0.0);
        Ok(())
    }

    #[test]
    fn test_running_reward() {
        let mut env = build();
        let step = env.step(&Action::from(vec![1.0]));
        assert!((step.reward - (-0.05 * 0.2) as f32).abs() < 1e-7);
    }

    #[test]
    fn test_clipping_is_equivalent_to_bound() {
        let mut env1 = build();
        let mut env2 = build();
        for _ in 0..5 {
            let s1 = env1.step(&Action::from(vec![10.0]));
            let s2 = env2.step(&Action::from(vec![2.0]));
            assert_eq!(s1.obs, s2.obs);
            assert_eq!(s1.reward, s2.reward);
        }
    }

    #[test]
    fn test_terminal_step() -> Result<()> {
        let mut env = build();
        env.reset()?;
        let mut n_steps = 0;
        let step = loop {
            let step = env.step(&Action::from(vec![0.0]));
            n_steps += 1;
            if step.is_done() {
                break step;
            }
        };
        assert_eq!(n_steps, 25);
        let expected = -step.obs[1].abs() - 0.1 * step.obs[2].abs();
        assert!((step.reward as f64 - expected).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_time_is_non_decreasing() -> Result<()> {
        let mut env = build();
        let mut t = env.reset()?[0];
        for _ in 0..10 {
            let step = env.step(&Action::from(vec![-1.0]));
            assert!(step.obs[0] > t);
            t = step.obs[0];
        }
        Ok(())
    }

    #[test]
    fn test_serde_config() -> Result<()> {
        let config = TerminalPendulumConfig::default().dt(0.05).inner_step_n(4);
        let dir = TempDir::new("pendulum_config")?;
        let path = dir.path().join("pendulum.yaml");
        config.save(&path)?;
        assert_eq!(TerminalPendulumConfig::load(&path)?, config);
        Ok(())
    }
}
