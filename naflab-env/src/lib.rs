#![warn(missing_docs)]
//! Environments of naflab.
//!
//! Every environment integrates closed-form dynamics with a fixed-step
//! explicit Euler scheme: a step of length `dt` consists of `inner_step_n`
//! substeps of length `dt / inner_step_n`. Actions are clipped into the
//! action bounds before use.
//!
//! | environment | state | reward |
//! |-------------|-------|--------|
//! | [`TerminalPendulum`] | `[t, θ, ω]` | utility, non-positive |
//! | [`RegulatorProblem`] | `[x0, .., x4]` | cost, non-negative |
//! | [`DubinsCar`] | `[t, x, y, φ]` | cost, non-negative |
//! | [`UnequalGame`] | `[t, x]` | payoff minimized by U, maximized by V |
//!
//! The opponents in [`opponents`] are closed-form and naive policies of the
//! players of [`UnequalGame`].
mod dubins_car;
pub mod opponents;
mod pendulum;
mod regulator;
mod unequal_game;
mod util;
pub use dubins_car::{DubinsCar, DubinsCarConfig};
pub use pendulum::{TerminalPendulum, TerminalPendulumConfig};
pub use regulator::{RegulatorProblem, RegulatorProblemConfig};
pub use unequal_game::{UnequalGame, UnequalGameConfig};
