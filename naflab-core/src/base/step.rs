//! Environment step.

/// Represents the observation and reward `(o_t+1, r_t)` emitted after an
/// action has been applied to an environment, with the episode flag.
#[derive(Clone, Debug)]
pub struct Step<O> {
    /// Observation.
    pub obs: O,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if the episode is terminated.
    pub is_done: bool,
}

impl<O> Step<O> {
    /// Constructs a [`Step`] object.
    pub fn new(obs: O, reward: f32, is_done: bool) -> Self {
        Step {
            obs,
            reward,
            is_done,
        }
    }

    #[inline]
    /// Terminated.
    pub fn is_done(&self) -> bool {
        self.is_done
    }
}
