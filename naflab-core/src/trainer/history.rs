//! Per-episode reward history.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct Row {
    episode: usize,
    reward: f32,
    mean_reward: f32,
}

/// Total rewards of episodes and their running mean over a trailing window.
///
/// The mean at episode `i` covers episodes `i - window..=i`, that is the
/// current episode and the `window` episodes before it.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardHistory {
    window: usize,

    /// Total reward of each episode.
    pub rewards: Vec<f32>,

    /// Mean of the total rewards over the trailing window, per episode.
    pub mean_rewards: Vec<f32>,
}

impl RewardHistory {
    /// Constructs an empty history averaging over the current episode and the
    /// `window` episodes before it.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            rewards: vec![],
            mean_rewards: vec![],
        }
    }

    /// Appends the total reward of an episode and returns the running mean.
    pub fn push(&mut self, reward: f32) -> f32 {
        self.rewards.push(reward);
        let start = self.rewards.len().saturating_sub(self.window + 1);
        let tail = &self.rewards[start..];
        let mean = tail.iter().sum::<f32>() / tail.len() as f32;
        self.mean_rewards.push(mean);
        mean
    }

    /// Returns the number of episodes.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Returns `true` if no episode has been recorded.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Returns the last running mean, if any.
    pub fn last_mean(&self) -> Option<f32> {
        self.mean_rewards.last().copied()
    }

    /// Appends the total rewards of another history.
    ///
    /// Running means are recomputed with the window of `self`, so the window
    /// spans the boundary. Used to join the phases of a curriculum.
    pub fn extend(&mut self, other: RewardHistory) {
        for reward in other.rewards {
            self.push(reward);
        }
    }

    /// Saves the history as a CSV file with columns `episode`, `reward` and
    /// `mean_reward`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        for (episode, (reward, mean_reward)) in
            self.rewards.iter().zip(self.mean_rewards.iter()).enumerate()
        {
            wtr.serialize(Row {
                episode,
                reward: *reward,
                mean_reward: *mean_reward,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Loads a history saved with [`RewardHistory::save`].
    pub fn load(path: impl AsRef<Path>, window: usize) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path)?;
        let mut history = Self::new(window);
        for row in rdr.deserialize() {
            let row: Row = row?;
            history.rewards.push(row.reward);
            history.mean_rewards.push(row.mean_reward);
        }
        Ok(history)
    }
}
