//! Environment.
use super::{Act, Obs, Step};
use anyhow::Result;

/// Represents an environment, typically a discretized control problem.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Performes an environment step.
    ///
    /// The action is clipped into the action bounds of the environment before
    /// being applied.
    fn step(&mut self, a: &Self::Act) -> Step<Self::Obs>;

    /// Resets the environment to its initial state and returns the state.
    fn reset(&mut self) -> Result<Self::Obs>;
}
