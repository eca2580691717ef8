//! Linear regulator problem.
use crate::util::{load_yaml, reached, save_yaml, substep, to_array};
use anyhow::Result;
use log::trace;
use naflab_core::{Action, Env, State, Step};
use ndarray::{arr1, arr2, Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of [`RegulatorProblem`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct RegulatorProblemConfig {
    /// State after reset.
    pub initial_state: Vec<f64>,

    /// Length of a step.
    pub dt: f64,

    /// The number of Euler substeps in a step.
    pub inner_step_n: usize,

    /// If given, the episode ends when the elapsed time reaches this value.
    /// Otherwise the environment never reports the end of an episode.
    pub terminal_time: Option<f64>,

    /// Lower bound of the control.
    pub action_min: Vec<f64>,

    /// Upper bound of the control.
    pub action_max: Vec<f64>,
}

impl Default for RegulatorProblemConfig {
    fn default() -> Self {
        Self {
            initial_state: vec![1.0; 5],
            dt: 0.001,
            inner_step_n: 1,
            terminal_time: None,
            action_min: vec![f64::NEG_INFINITY],
            action_max: vec![f64::INFINITY],
        }
    }
}

impl RegulatorProblemConfig {
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
    pub fn terminal_time(mut self, terminal_time: Option<f64>) -> Self {
        self.terminal_time = terminal_time;
        self
    }

    /// Sets the bounds of the control.
    pub fn action_bounds(mut self, min: f64, max: f64) -> Self {
        self.action_min = vec![min];
        self.action_max = vec![max];
        self
    }

    /// Constructs [`RegulatorProblemConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_yaml(path)
    }

    /// Saves [`RegulatorProblemConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_yaml(self, path)
    }
}

/// The linear system `x' = A x + B u` with five states and a scalar control.
///
/// Each step pays the cost `(x0² + u²) dt`, evaluated at the state after the
/// step. The reward is therefore non-negative and agents are trained on its
/// negation. The elapsed time is not part of the state; see
/// [`RegulatorProblem::time`].
pub struct RegulatorProblem {
    config: RegulatorProblemConfig,
    a: Array2<f64>,
    b: Array1<f64>,
    action_min: Array1<f64>,
    action_max: Array1<f64>,
    inner_dt: f64,
    state: Array1<f64>,
    t: f64,
}

impl RegulatorProblem {
    /// Dimension of the state.
    pub const STATE_DIM: usize = 5;

    /// Dimension of the action.
    pub const ACTION_DIM: usize = 1;

    /// Returns the elapsed time of the current episode.
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RegulatorProblemConfig {
        &self.config
    }
}

impl Env for RegulatorProblem {
    type Config = RegulatorProblemConfig;
    type Obs = State;
    type Act = Action;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        let a = arr2(&[
            [-0.2, 0.5, 0.0, 0.0, 0.0],
            [0.0, -0.5, 1.6, 0.0, 0.0],
            [0.0, 0.0, -1.0 / 7.0, 6.0 / 7.0, 0.0],
            [0.0, 0.0, 0.0, -0.25, 7.5],
            [0.0, 0.0, 0.0, 0.0, -0.1],
        ]);
        let b = arr1(&[0.0, 0.0, 0.0, 0.0, 0.3]);

        Ok(Self {
            config: config.clone(),
            a,
            b,
            action_min: to_array(&config.action_min),
            action_max: to_array(&config.action_max),
            inner_dt: substep(config.dt, config.inner_step_n)?,
            state: to_array(&config.initial_state),
            t: 0.0,
        })
    }

    fn reset(&mut self) -> Result<State> {
        self.state = to_array(&self.config.initial_state);
        self.t = 0.0;
        Ok(State::new(self.state.clone()))
    }

    fn step(&mut self, a: &Action) -> Step<State> {
        let u = a.clip(&self.action_min, &self.action_max)[0];

        for _ in 0..self.config.inner_step_n {
            let dx = self.a.dot(&self.state) + &self.b * u;
            self.state = &self.state + &(dx * self.inner_dt);
            self.t += self.inner_dt;
        }

        let reward = (self.state[0] * self.state[0] + u * u) * self.config.dt;
        let is_done = match self.config.terminal_time {
            Some(terminal_time) => reached(self.t, terminal_time, self.inner_dt),
            None => false,
        };
        trace!("t={} state={:?} reward={}", self.t, self.state, reward);

        Step::new(State::new(self.state.clone()), reward as f32, is_done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn build(config: &RegulatorProblemConfig) -> RegulatorProblem {
        RegulatorProblem::build(config, 0).unwrap()
    }

    #[test]
    fn test_reset_and_time() -> Result<()> {
        let mut env = build(&RegulatorProblemConfig::default());
        assert_eq!(env.reset()?, State::from(vec![1.0; 5]));

        let step = env.step(&Action::from(vec![0.0]));
        assert!((env.time() - 0.001).abs() < 1e-15);
        assert!(!step.is_done());
        Ok(())
    }

    #[test]
    fn test_euler_step() {
        let mut env = build(&RegulatorProblemConfig::default());
        let step = env.step(&Action::from(vec![2.0]));

        // x' = A 1 + B u
        let dx = [0.3, 1.1, 5.0 / 7.0, 7.25, -0.1 + 0.6];
        for i in 0..5 {
            assert!((step.obs[i] - (1.0 + dx[i] * 0.001)).abs() < 1e-12);
        }
        let x0 = 1.0 + 0.3 * 0.001;
        let expected = (x0 * x0 + 4.0) * 0.001;
        assert!((step.reward as f64 - expected).abs() < 1e-7);
    }

    #[test]
    fn test_never_done_without_terminal_time() {
        let mut env = build(&RegulatorProblemConfig::default().dt(0.1));
        for _ in 0..1000 {
            assert!(!env.step(&Action::from(vec![0.0])).is_done());
        }
    }

    #[test]
    fn test_terminal_time() {
        let config = RegulatorProblemConfig::default()
            .dt(0.01)
            .terminal_time(Some(0.1));
        let mut env = build(&config);
        let n_steps = (1..)
            .find(|_| env.step(&Action::from(vec![0.0])).is_done())
            .unwrap();
        assert_eq!(n_steps, 10);
    }

    #[test]
    fn test_clipping_is_equivalent_to_bound() {
        let config = RegulatorProblemConfig::default().action_bounds(-1.0, 1.0);
        let mut env1 = build(&config);
        let mut env2 = build(&config);
        let s1 = env1.step(&Action::from(vec![-7.0]));
        let s2 = env2.step(&Action::from(vec![-1.0]));
        assert_eq!(s1.obs, s2.obs);
        assert_eq!(s1.reward, s2.reward);
    }

    #[test]
    fn test_serde_config() -> Result<()> {
        let config = RegulatorProblemConfig::default()
            .terminal_time(Some(3.0))
            .action_bounds(-10.0, 10.0);
        let dir = TempDir::new("regulator_config")?;
        let path = dir.path().join("regulator.yaml");
        config.save(&path)?;
        assert_eq!(RegulatorProblemConfig::load(&path)?, config);
        Ok(())
    }
}
