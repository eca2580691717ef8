//! Bounded FIFO replay memory with uniform sampling.
//!
//! # Examples
//!
//! ```rust
//! use naflab_core::{
//!     replay_buffer::{ReplayBuffer, ReplayBufferConfig, Transition},
//!     Action, ExperienceBufferBase, ReplayBufferBase, State,
//! };
//!
//! let config = ReplayBufferConfig::default().capacity(2).seed(7);
//! let mut buffer = ReplayBuffer::<State, Action>::build(&config);
//! for i in 0..3 {
//!     let tr = Transition {
//!         obs: State::from(vec![i as f64]),
//!         act: Action::from(vec![0.0]),
//!         reward: i as f32,
//!         is_done: false,
//!         next_obs: State::from(vec![i as f64 + 1.0]),
//!     };
//!     buffer.push(tr).unwrap();
//! }
//! assert_eq!(buffer.len(), 2);
//! let batch = buffer.batch(4).unwrap();
//! assert_eq!(batch.len(), 4);
//! ```
mod base;
mod batch;
mod config;
pub use base::ReplayBuffer;
pub use batch::{Transition, TransitionBatch};
pub use config::ReplayBufferConfig;
