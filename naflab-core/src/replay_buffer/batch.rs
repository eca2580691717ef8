//! Transitions and batches of transitions.

/// A transition `(o_t, a_t, r_t, is_done_t, o_t+1)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<O, A> {
    /// Observation.
    pub obs: O,

    /// Action.
    pub act: A,

    /// Reward.
    pub reward: f32,

    /// Done flag.
    pub is_done: bool,

    /// Next observation.
    pub next_obs: O,
}

/// A batch of transitions, stored column-wise.
#[derive(Clone, Debug)]
pub struct TransitionBatch<O, A> {
    /// Observations.
    pub obs: Vec<O>,

    /// Actions.
    pub act: Vec<A>,

    /// Next observations.
    pub next_obs: Vec<O>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Done flags.
    pub is_done: Vec<i8>,

    /// Sample indices.
    pub ix_sample: Vec<usize>,
}

impl<O, A> TransitionBatch<O, A> {
    /// Creates an empty batch with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: Vec::with_capacity(capacity),
            act: Vec::with_capacity(capacity),
            next_obs: Vec::with_capacity(capacity),
            reward: Vec::with_capacity(capacity),
            is_done: Vec::with_capacity(capacity),
            ix_sample: Vec::with_capacity(capacity),
        }
    }

    /// Appends a transition sampled at index `ix`.
    pub fn push(&mut self, ix: usize, tr: Transition<O, A>) {
        self.obs.push(tr.obs);
        self.act.push(tr.act);
        self.next_obs.push(tr.next_obs);
        self.reward.push(tr.reward);
        self.is_done.push(tr.is_done as i8);
        self.ix_sample.push(ix);
    }

    /// Unpack the data `(o_t, a_t, o_t+1, r_t, is_done_t)`.
    pub fn unpack(self) -> (Vec<O>, Vec<A>, Vec<O>, Vec<f32>, Vec<i8>) {
        (self.obs, self.act, self.next_obs, self.reward, self.is_done)
    }

    /// Returns the number of transitions.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch has no transition.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}
