//! Ring-buffer replay memory.
use super::{ReplayBufferConfig, Transition, TransitionBatch};
use crate::{ExperienceBufferBase, ReplayBufferBase};
use anyhow::{bail, Result};
use rand::{rngs::StdRng, RngCore, SeedableRng};

/// A bounded replay memory of transitions.
///
/// Once `capacity` transitions are stored, each push overwrites the oldest
/// one. Batches are drawn uniformly with replacement.
pub struct ReplayBuffer<O, A> {
    capacity: usize,
    i: usize,
    size: usize,
    items: Vec<Transition<O, A>>,
    rng: StdRng,
}

impl<O, A> ReplayBuffer<O, A> {
    /// Returns the maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over the stored transitions from the oldest to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition<O, A>> {
        let start = if self.size < self.capacity { 0 } else { self.i };
        (0..self.size).map(move |k| &self.items[(start + k) % self.capacity])
    }
}

impl<O, A> ExperienceBufferBase for ReplayBuffer<O, A> {
    type Item = Transition<O, A>;

    fn len(&self) -> usize {
        self.size
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        if self.items.len() < self.capacity {
            self.items.push(tr);
        } else {
            self.items[self.i] = tr;
        }

        self.i = (self.i + 1) % self.capacity;
        self.size += 1;
        if self.size >= self.capacity {
            self.size = self.capacity;
        }

        Ok(())
    }
}

impl<O, A> ReplayBufferBase for ReplayBuffer<O, A>
where
    O: Clone,
    A: Clone,
{
    type Config = ReplayBufferConfig;
    type Batch = TransitionBatch<O, A>;

    fn build(config: &Self::Config) -> Self {
        // Zero capacity would make the ring index undefined.
        let capacity = config.capacity.max(1);

        Self {
            capacity,
            i: 0,
            size: 0,
            items: Vec::with_capacity(capacity.min(1 << 16)),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        if self.size == 0 {
            bail!("Cannot sample from an empty replay buffer");
        }

        let mut batch = TransitionBatch::with_capacity(size);
        for _ in 0..size {
            let ix = (self.rng.next_u32() as usize) % self.size;
            batch.push(ix, self.items[ix].clone());
        }

        Ok(batch)
    }

    fn clear(&mut self) {
        self.items.clear();
        self.i = 0;
        self.size = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tr(i: usize) -> Transition<usize, usize> {
        Transition {
            obs: i,
            act: i,
            reward: i as f32,
            is_done: false,
            next_obs: i + 1,
        }
    }

    fn build(capacity: usize) -> ReplayBuffer<usize, usize> {
        let config = ReplayBufferConfig::default().capacity(capacity).seed(0);
        ReplayBuffer::build(&config)
    }

    #[test]
    fn test_len_is_bounded_by_capacity() -> Result<()> {
        let mut buffer = build(5);
        for i in 0..3 {
            buffer.push(tr(i))?;
        }
        assert_eq!(buffer.len(), 3);

        for i in 3..12 {
            buffer.push(tr(i))?;
        }
        assert_eq!(buffer.len(), 5);
        Ok(())
    }

    #[test]
    fn test_oldest_is_evicted_first() -> Result<()> {
        let mut buffer = build(3);
        for i in 0..5 {
            buffer.push(tr(i))?;
        }
        let obs = buffer.iter().map(|tr| tr.obs).collect::<Vec<_>>();
        assert_eq!(obs, vec![2, 3, 4]);
        Ok(())
    }

    #[test]
    fn test_batch_samples_stored_transitions() -> Result<()> {
        let mut buffer = build(4);
        for i in 10..16 {
            buffer.push(tr(i))?;
        }
        let batch = buffer.batch(64)?;
        assert_eq!(batch.len(), 64);
        assert!(batch.obs.iter().all(|o| (12..16).contains(o)));
        assert!(batch
            .obs
            .iter()
            .zip(batch.next_obs.iter())
            .all(|(o, o_)| o + 1 == *o_));
        Ok(())
    }

    #[test]
    fn test_batch_from_empty_buffer_fails() {
        let mut buffer = build(4);
        assert!(buffer.batch(1).is_err());
    }

    #[test]
    fn test_clear() -> Result<()> {
        let mut buffer = build(4);
        for i in 0..6 {
            buffer.push(tr(i))?;
        }
        buffer.clear();
        assert!(buffer.is_empty());
        buffer.push(tr(7))?;
        assert_eq!(buffer.iter().map(|tr| tr.obs).collect::<Vec<_>>(), vec![7]);
        Ok(())
    }
}
