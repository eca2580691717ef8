//! NAF agents on small optimal control problems and a differential game.
//!
//! naflab consists of the following crates:
//!
//! * [naflab-core](../naflab_core/index.html) provides the traits of
//!   environments, games, policies and agents, the replay memory, records and
//!   the training loops, independent of any deep learning backend.
//! * [naflab-env](../naflab_env/index.html) implements the environments:
//!   a pendulum with terminal time, a linear regulator, a Dubins car and the
//!   "paratrooper" game of players with unequal controls.
//! * [naflab-candle-agent](../naflab_candle_agent/index.html) implements the
//!   normalized advantage function (NAF) agent with
//!   [candle](https://crates.io/crates/candle-core), with either a learned or
//!   a reward-based advantage.
//! * This crate collects the experiments under `examples/` and a few helpers
//!   shared by them.
//!
//! ```bash
//! cargo run --release --example naf_pendulum -- --n-episodes 200
//! cargo run --release --example naf_r_dubins_car -- --runs 5
//! cargo run --release --example naf_paratrooper
//! ```
pub mod util;
