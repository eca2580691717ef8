//! NAF agent.
//!
//! [`Naf`] learns `Q(s, a) = V(s) + A(s, a)` with an advantage quadratic in
//! the action, so that the greedy action is the output `mu(s)` of a network.
//! The advantage is either learned ([`AdvantageConfig::Learned`]) or fixed by
//! the running cost of the action ([`AdvantageConfig::RewardBased`]).
//!
//! ```no_run
//! use naflab_candle_agent::naf::{Naf, NafConfig, NafModelConfig, NoiseConfig};
//! # fn main() -> anyhow::Result<()> {
//! let model_config = NafModelConfig::new(3, vec![-2.0], vec![2.0], vec![32, 32]);
//! let config = NafConfig::new(model_config)
//!     .noise_config(NoiseConfig::geometric_over(1.0, 0.01, 200))
//!     .batch_size(128);
//! let _agent = Naf::build(config)?;
//! # Ok(())
//! # }
//! ```
mod base;
mod config;
mod model;
mod noise;
pub use base::Naf;
pub use config::NafConfig;
pub use model::{AdvantageConfig, NafModel, NafModelConfig};
pub use noise::{NoiseConfig, NoiseDecay, OuNoise};
