//! Reward signs, player roles and the turn scheduler of alternating training.
use serde::{Deserialize, Serialize};

/// Sign applied to environment rewards before they are handed to an agent.
///
/// Agents maximize what they are fitted on, so environments whose reward is a
/// cost are trained with [`RewardSign::Negate`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum RewardSign {
    /// Fit on the reward as is.
    Keep,

    /// Fit on the negated reward.
    Negate,
}

impl RewardSign {
    /// Applies the sign to `reward`.
    pub fn apply(&self, reward: f32) -> f32 {
        match self {
            Self::Keep => reward,
            Self::Negate => -reward,
        }
    }
}

/// Player of a [`Game`](crate::Game).
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum Role {
    /// The minimizing player.
    U,

    /// The maximizing player.
    V,
}

impl Role {
    /// Returns the sign under which the player is fitted.
    pub fn reward_sign(&self) -> RewardSign {
        match self {
            Self::U => RewardSign::Negate,
            Self::V => RewardSign::Keep,
        }
    }
}

/// Which player is updated at the current step.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Turn {
    /// U fits, V only stores its transition.
    UpdatingU,

    /// V fits, U only stores its transition.
    UpdatingV,
}

/// Alternates the updating player every `block_len` steps.
///
/// ```rust
/// use naflab_core::{Turn, TurnScheduler};
///
/// let mut scheduler = TurnScheduler::new(2);
/// let turns = (0..5)
///     .map(|_| {
///         let turn = scheduler.turn();
///         scheduler.tick();
///         turn
///     })
///     .collect::<Vec<_>>();
/// assert_eq!(
///     turns,
///     vec![Turn::UpdatingU, Turn::UpdatingU, Turn::UpdatingV, Turn::UpdatingV, Turn::UpdatingU]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct TurnScheduler {
    block_len: usize,
    counter: usize,
}

impl TurnScheduler {
    /// Constructs a scheduler starting with [`Turn::UpdatingU`].
    pub fn new(block_len: usize) -> Self {
        Self {
            block_len: block_len.max(1),
            counter: 0,
        }
    }

    /// Returns the turn at the current step.
    pub fn turn(&self) -> Turn {
        match (self.counter / self.block_len) % 2 {
            0 => Turn::UpdatingU,
            _ => Turn::UpdatingV,
        }
    }

    /// Advances the step counter.
    pub fn tick(&mut self) {
        self.counter += 1;
    }

    /// Restarts from [`Turn::UpdatingU`].
    pub fn reset(&mut self) {
        self.counter = 0;
    }
}
