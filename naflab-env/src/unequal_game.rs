//! One-dimensional pursuit-evasion game of players with unequal controls.
use crate::util::{load_yaml, reached, save_yaml, substep};
use anyhow::Result;
use log::trace;
use naflab_core::{Action, Game, State, Step};
use ndarray::arr1;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of [`UnequalGame`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct UnequalGameConfig {
    /// Position after reset.
    pub x0: f64,

    /// Bound of the control of U, `u ∈ [-u_max, u_max]`.
    pub u_max: f64,

    /// Bound of the control of V, `v ∈ [-v_max, v_max]`.
    pub v_max: f64,

    /// Length of a step.
    pub dt: f64,

    /// The number of Euler substeps in a step.
    pub inner_step_n: usize,

    /// The episode ends when the elapsed time reaches this value.
    pub terminal_time: f64,
}

impl Default for UnequalGameConfig {
    fn default() -> Self {
        Self {
            x0: 1.0,
            u_max: 1.0,
            v_max: 0.5,
            dt: 0.01,
            inner_step_n: 1,
            terminal_time: 2.0,
        }
    }
}

impl UnequalGameConfig {
    /// Sets the initial position.
    pub fn x0(mut self, x0: f64) -> Self {
        self.x0 = x0;
        self
    }

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

    /// Constructs [`UnequalGameConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_yaml(path)
    }

    /// Saves [`UnequalGameConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_yaml(self, path)
    }
}

/// The "paratrooper" game `x' = u + v`.
///
/// The state is `[t, x]`. Player U, with the stronger control, wants to land
/// close to the origin and player V pushes away from it. The reward is zero
/// until the terminal step, which pays `|x(T)|`: U minimizes and V maximizes
/// it.
pub struct UnequalGame {
    config: UnequalGameConfig,
    inner_dt: f64,
    t: f64,
    x: f64,
    is_done: bool,
}

impl UnequalGame {
    /// Dimension of the state.
    pub const STATE_DIM: usize = 2;

    /// Dimension of the action of each player.
    pub const ACTION_DIM: usize = 1;

    /// Returns the configuration.
    pub fn config(&self) -> &UnequalGameConfig {
        &self.config
    }

    fn state(&self) -> State {
        State::new(arr1(&[self.t, self.x]))
    }
}

impl Game for UnequalGame {
    type Config = UnequalGameConfig;
    type Obs = State;
    type Act = Action;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            inner_dt: substep(config.dt, config.inner_step_n)?,
            t: 0.0,
            x: config.x0,
            is_done: false,
        })
    }

    fn reset(&mut self) -> Result<State> {
        self.t = 0.0;
        self.x = self.config.x0;
        self.is_done = false;
        Ok(self.state())
    }

    fn step(&mut self, u: &Action, v: &Action) -> Step<State> {
        let c = &self.config;
        let u = u[0].clamp(-c.u_max, c.u_max);
        let v = v[0].clamp(-c.v_max, c.v_max);

        for _ in 0..c.inner_step_n {
            self.x += (u + v) * self.inner_dt;
            self.t += self.inner_dt;
        }

        self.is_done = reached(self.t, c.terminal_time, self.inner_dt);
        let reward = if self.is_done { self.x.abs() } else { 0.0 };
        trace!("t={} x={} reward={}", self.t, self.x, reward);

        Step::new(self.state(), reward as f32, self.is_done)
    }

    fn is_done(&self) -> bool {
        self.is_done
    }
}
