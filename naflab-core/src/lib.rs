#![warn(missing_docs)]
//! Core traits and training loops of naflab.
//!
//! This crate does not depend on any deep learning backend. It defines
//! the interfaces between environments ([`Env`], [`Game`]) and agents
//! ([`Policy`], [`Agent`]), the bounded replay memory, records used for
//! logging and the training loops composing them.
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Act, Action, Agent, Env, ExperienceBufferBase, Game, Obs, Policy, ReplayBufferBase, State,
    Step,
};

mod evaluator;
pub use evaluator::{evaluate_game, DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{
    GameTrainer, RewardHistory, RewardSign, Role, Trainer, TrainerConfig, Turn, TurnScheduler,
};
