//! Dubins car steered to a target point.
use crate::util::{load_yaml, reached, save_yaml, substep, to_array};
use anyhow::Result;
use log::trace;
use naflab_core::{Action, Env, State, Step};
use ndarray::{arr1, Array1};
use serde::{Deserialize, Serialize};
use std::{f64::consts::PI, path::Path};

/// Configuration of [`DubinsCar`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DubinsCarConfig {
    /// State `[t, x, y, φ]` after reset.
    pub initial_state: Vec<f64>,

    /// Length of a step.
    pub dt: f64,

    /// The number of Euler substeps in a step.
    pub inner_step_n: usize,

    /// The episode ends when the elapsed time reaches this value.
    pub terminal_time: f64,

    /// Coefficient of the running cost of the steering.
    pub r: f64,

    /// Position `(x, y)` the car should reach at the terminal time.
    pub target: [f64; 2],

    /// Lower bound of the steering.
    pub action_min: Vec<f64>,

    /// Upper bound of the steering.
    pub action_max: Vec<f64>,
}

impl Default for DubinsCarConfig {
    /// The asymmetric action interval `[-0.5, 1]`.
    fn default() -> Self {
        Self {
            initial_state: vec![0.0; 4],
            dt: 0.1,
            inner_step_n: 10,
            terminal_time: 2.0 * PI,
            r: 0.1,
            target: [4.0, 0.0],
            action_min: vec![-0.5],
            action_max: vec![1.0],
        }
    }
}

impl DubinsCarConfig {
    /// The symmetric action interval `[-1, 1]`.
    pub fn symmetric() -> Self {
        Self {
            action_min: vec![-1.0],
            action_max: vec![1.0],
            ..Self::default()
        }
    }

    /// Sets the length of a step.
    pub fn dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Sets the number of substeps.
    pub fn inner_step_n(mut self, inner_step_n: usize) -> Self {
        self.inner_step_n = inner_step_n;
        self
    }

    /// Sets the terminal time.
    pub fn terminal_time(mut self, terminal_time: f64) -> Self {
        self.terminal_time = terminal_time;
        self
    }

    /// Sets the target position.
    pub fn target(mut self, x: f64, y: f64) -> Self {
        self.target = [x, y];
        self
    }

    /// Constructs [`DubinsCarConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_yaml(path)
    }

    /// Saves [`DubinsCarConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_yaml(self, path)
    }
}

/// A car moving at unit speed, steered by its angular velocity.
///
/// The state is `[t, x, y, φ]` with dynamics
///
/// ```text
/// t' = 1,  x' = cos φ,  y' = sin φ,  φ' = u
/// ```
///
/// Each step costs `r u² dt`. The step reaching the terminal time
/// additionally costs the squared distance to the target. The reward is this
/// non-negative cost.
pub struct DubinsCar {
    config: DubinsCarConfig,
    action_min: Array1<f64>,
    action_max: Array1<f64>,
    inner_dt: f64,
    state: Array1<f64>,
}

impl DubinsCar {
    /// Dimension of the state.
    pub const STATE_DIM: usize = 4;

    /// Dimension of the action.
    pub const ACTION_DIM: usize = 1;

    /// Returns the configuration.
    pub fn config(&self) -> &DubinsCarConfig {
        &self.config
    }

    /// Returns the length of a step.
    pub fn dt(&self) -> f64 {
        self.config.dt
    }

    /// Changes the length of a step, keeping the number of substeps.
    ///
    /// Takes effect from the next step.
    pub fn set_dt(&mut self, dt: f64) {
        self.config.dt = dt;
        self.inner_dt = dt / self.config.inner_step_n as f64;
    }

    fn derivative(state: &Array1<f64>, u: f64) -> Array1<f64> {
        arr1(&[1.0, state[3].cos(), state[3].sin(), u])
    }
}

impl Env for DubinsCar {
    type Config = DubinsCarConfig;
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
        let u = a.clip(&self.action_min, &self.action_max)[0];

        for _ in 0..self.config.inner_step_n {
            let ds = Self::derivative(&self.state, u);
            self.state = &self.state + &(ds * self.inner_dt);
        }

        let mut reward = self.config.r * u * u * self.config.dt;
        let is_done = reached(self.state[0], self.config.terminal_time, self.inner_dt);
        if is_done {
            let [x, y] = self.config.target;
            reward += (self.state[1] - x).powi(2) + (self.state[2] - y).powi(2);
        }
        trace!("state={:?} reward={} is_done={}", self.state, reward, is_done);

        Step::new(State::new(self.state.clone()), reward as f32, is_done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_straight_line() -> Result<()> {
        let mut env = DubinsCar::build(&DubinsCarConfig::default(), 0)?;
        env.reset()?;
        let step = env.step(&Action::from(vec![0.0]));

        assert!((step.obs[0] - 0.1).abs() < 1e-12);
        assert!((step.obs[1] - 0.1).abs() < 1e-12);
        assert!(step.obs[2].abs() < 1e-12);
        assert_eq!(step.reward, 0.0);
        assert!(!step.is_done());
        Ok(())
    }

    #[test]
    fn test_asymmetric_and_symmetric_bounds() -> Result<()> {
        let mut asym = DubinsCar::build(&DubinsCarConfig::default(), 0)?;
        let mut sym = DubinsCar::build(&DubinsCarConfig::symmetric(), 0)?;
        let s_asym = asym.step(&Action::from(vec![-1.0]));
        let s_sym = sym.step(&Action::from(vec![-1.0]));

        assert!((s_asym.obs[3] + 0.05).abs() < 1e-12);
        assert!((s_sym.obs[3] + 0.1).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_terminal_cost() -> Result<()> {
        let config = DubinsCarConfig::default().terminal_time(1.0);
        let mut env = DubinsCar::build(&config, 0)?;
        env.reset()?;
        let step = loop {
            let step = env.step(&Action::from(vec![0.0]));
            if step.is_done() {
                break step;
            }
        };

        // Straight at unit speed for one time unit, 3 away from (4, 0).
        assert!((step.obs[0] - 1.0).abs() < 1e-9);
        assert!((step.reward - 9.0).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_set_dt() -> Result<()> {
        let mut env = DubinsCar::build(&DubinsCarConfig::default(), 0)?;
        env.set_dt(0.5);
        assert_eq!(env.dt(), 0.5);
        assert_eq!(env.config().dt, 0.5);
        let step = env.step(&Action::from(vec![1.0]));
        assert!((step.obs[0] - 0.5).abs() < 1e-12);
        assert!((step.reward - 0.1 * 0.5).abs() < 1e-7);
        Ok(())
    }

    #[test]
    fn test_serde_config() -> Result<()> {
        let config = DubinsCarConfig::symmetric().inner_step_n(100).dt(1.0);
        let dir = TempDir::new("dubins_car_config")?;
        let path = dir.path().join("dubins_car.yaml");
        config.save(&path)?;
        assert_eq!(DubinsCarConfig::load(&path)?, config);
        Ok(())
    }
}
