//! Agent.
use super::Policy;
use crate::{record::Record, replay_buffer::Transition};
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy owning its replay memory.
pub trait Agent<O, A>: Policy<O, A> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Appends a transition to the replay memory without optimization.
    fn push(&mut self, transition: Transition<O, A>) -> Result<()>;

    /// Returns the number of transitions in the replay memory.
    fn memory_len(&self) -> usize;

    /// Performs an optimization step and returns some information.
    ///
    /// The agent may skip the optimization, for example while its replay
    /// memory holds fewer transitions than a batch. The returned record
    /// then lacks the loss.
    fn opt_with_record(&mut self) -> Result<Record>;

    /// Performs an optimization step.
    fn opt(&mut self) -> Result<()> {
        let _ = self.opt_with_record()?;
        Ok(())
    }

    /// Appends a transition and performs an optimization step.
    fn fit(&mut self, transition: Transition<O, A>) -> Result<Record> {
        self.push(transition)?;
        self.opt_with_record()
    }

    /// Called by trainers at the end of every episode.
    fn end_episode(&mut self) {}

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
