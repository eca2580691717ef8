//! Policy.

/// A policy, a mapping from an observation to an action.
///
/// The mapping can be either of deterministic or stochastic. Closed-form
/// controllers and learning agents implement this trait alike, which lets
/// a learning agent play against a fixed opponent.
pub trait Policy<O, A> {
    /// Sample an action given an observation.
    fn sample(&mut self, obs: &O) -> A;
}
