//! Two-player zero-sum game.
use super::{Act, Obs, Step};
use anyhow::Result;

/// Represents a two-player zero-sum differential game.
///
/// Player U minimizes and player V maximizes the reward emitted in [`Step`].
/// Both players observe the same state and act at every step.
pub trait Game {
    /// Configurations.
    type Config: Clone;

    /// Observation shared by both players.
    type Obs: Obs;

    /// Action of a player.
    type Act: Act;

    /// Builds a game with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Applies the actions of both players.
    fn step(&mut self, u: &Self::Act, v: &Self::Act) -> Step<Self::Obs>;

    /// Resets the game to its initial state and returns the state.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Returns `true` if the current episode has finished.
    fn is_done(&self) -> bool;
}
