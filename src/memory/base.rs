use rand::{seq::SliceRandom, thread_rng};

use crate::{ds::RingBuffer, env::Environment};

use super::{Exp, ExpBatch};

/// A bounded experience replay memory
///
/// Interactions are stored in a [`RingBuffer`], so once `capacity` is reached the oldest ones are
/// overwritten. Batches are sampled uniformly without replacement.
pub struct ReplayMemory<E: Environment> {
    memory: RingBuffer<Exp<E>>,
}

impl<E: Environment> ReplayMemory<E> {
    /// **Panics** if `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        Self {
            memory: RingBuffer::new(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.memory.capacity()
    }

    /// Add a new interaction to the memory
    pub fn push(&mut self, exp: Exp<E>) {
        self.memory.push(exp);
    }

    /// Sample a random batch of interactions
    ///
    /// ### Returns
    /// - `Some(experiences)` if `batch_size` is less than or equal to the memory length
    /// - `None` otherwise
    pub fn sample(&self, batch_size: usize) -> Option<Vec<&Exp<E>>> {
        (batch_size <= self.memory.len()).then(|| {
            self.memory
                .view()
                .choose_multiple(&mut thread_rng(), batch_size)
                .collect()
        })
    }

    /// Sample a random batch of interactions and unzip it into an [`ExpBatch`]
    ///
    /// ### Returns
    /// - `Some(batch)` if `batch_size` is less than or equal to the memory length
    /// - `None` otherwise
    pub fn sample_zipped(&self, batch_size: usize) -> Option<ExpBatch<E>> {
        self.sample(batch_size)
            .map(|experiences| ExpBatch::from_refs(experiences, batch_size))
    }
}
