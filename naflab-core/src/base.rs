//! Core functionalities.
mod agent;
mod env;
mod game;
mod policy;
mod replay_buffer;
mod step;
mod vector;
pub use agent::Agent;
pub use env::Env;
pub use game::Game;
pub use policy::Policy;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
use std::fmt::Debug;
pub use step::Step;
pub use vector::{Action, State};

/// An observation of an environment.
pub trait Obs: Clone + Debug {
    /// Returns the dimension of the observation.
    fn len(&self) -> usize;
}

/// An action applied to an environment.
pub trait Act: Clone + Debug {
    /// Returns the dimension of the action.
    fn len(&self) -> usize;
}
