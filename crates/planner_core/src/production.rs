//! Production queues.
//!
//! Every entry that takes build time becomes a [`ProductionItem`]. Items made
//! by an entity sit in that entity's [`ProductionQueue`]; worker-built
//! structures and larva-born units sit in an unbounded queue owned by the
//! simulation.
//!
//! Progress is tracked in fixed-point frames so chrono boost can speed items
//! up by a fractional rate without losing determinism.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{fixed_serde, ratio, Fixed};

/// Who is producing an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProducerRef {
    /// A structure or unit with its own queue.
    Entity(u32),
    /// A worker that is busy until the item completes.
    Worker,
    /// A larva that was consumed.
    Larva,
    /// Nothing is tied up (warped-in or consumed-worker structures).
    Unattended,
}

/// Error adding to a production queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProductionError {
    /// The production queue is full.
    #[error("Production queue is full")]
    QueueFull,
}

/// An item currently in production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionItem {
    /// Index of the action that started it.
    pub action_index: usize,
    /// Catalog entry being produced.
    pub entry: String,
    /// Current progress in frames.
    #[serde(with = "fixed_serde")]
    pub progress: Fixed,
    /// Total build time in frames.
    pub total_time: u32,
    /// Who produces it.
    pub producer: ProducerRef,
}

impl ProductionItem {
    /// Create a new production item.
    #[must_use]
    pub fn new(
        action_index: usize,
        entry: impl Into<String>,
        total_time: u32,
        producer: ProducerRef,
    ) -> Self {
        Self {
            action_index,
            entry: entry.into(),
            progress: Fixed::ZERO,
            total_time,
            producer,
        }
    }

    /// Check if production is complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress >= Fixed::from_num(self.total_time)
    }

    /// Advance production by one frame, 50% faster when boosted.
    pub fn tick(&mut self, boosted: bool) {
        if self.is_complete() {
            return;
        }
        self.progress += if boosted { ratio(3, 2) } else { Fixed::ONE };
    }
}

/// Production queue of one producer.
///
/// Unlike a game client queue, items here never wait in line: every item is
/// actively produced, so the capacity is the number of parallel slots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductionQueue {
    /// Items being produced.
    pub items: Vec<ProductionItem>,
    /// Parallel production slots.
    pub capacity: usize,
}

impl ProductionQueue {
    /// Default number of slots.
    pub const DEFAULT_CAPACITY: usize = 1;

    /// Create a new empty production queue.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a production queue with a specific number of slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    /// Queue without a slot limit.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::with_capacity(usize::MAX)
    }

    /// Check if every slot is in use.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Check if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items in production.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Start producing an item.
    ///
    /// Returns `Err` if every slot is in use.
    pub fn add(&mut self, item: ProductionItem) -> Result<(), ProductionError> {
        if self.is_full() {
            return Err(ProductionError::QueueFull);
        }
        self.items.push(item);
        Ok(())
    }

    /// Whether any item produces the named entry.
    #[must_use]
    pub fn contains(&self, entry: &str) -> bool {
        self.items.iter().any(|item| item.entry == entry)
    }

    /// Iterate over items in production.
    pub fn iter(&self) -> impl Iterator<Item = &ProductionItem> {
        self.items.iter()
    }

    /// Advance every item by one frame and remove the finished ones.
    ///
    /// Finished items are returned in the order they were started.
    pub fn tick(&mut self, boosted: bool) -> Vec<ProductionItem> {
        for item in &mut self.items {
            item.tick(boosted);
        }
        if !self.items.iter().any(ProductionItem::is_complete) {
            return Vec::new();
        }
        let (done, running): (Vec<_>, Vec<_>) =
            self.items.drain(..).partition(ProductionItem::is_complete);
        self.items = running;
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(index: usize, frames: u32) -> ProductionItem {
        ProductionItem::new(index, "Marine", frames, ProducerRef::Entity(1))
    }

    #[test]
    fn test_item_completes_after_total_time() {
        let mut item = item(0, 3);
        assert!(!item.is_complete());
        item.tick(false);
        item.tick(false);
        assert!(!item.is_complete());
        item.tick(false);
        assert!(item.is_complete());

        // ticking a finished item is a no-op
        item.tick(false);
        assert_eq!(item.progress, Fixed::from_num(3));
    }

    #[test]
    fn test_boost_is_half_again_faster() {
        let mut item = item(0, 6);
        for _ in 0..4 {
            item.tick(true);
        }
        assert!(item.is_complete());
    }

    #[test]
    fn test_queue_capacity() {
        let mut queue = ProductionQueue::new();
        assert!(queue.add(item(0, 5)).is_ok());
        assert_eq!(queue.add(item(1, 5)), Err(ProductionError::QueueFull));

        let mut reactor = ProductionQueue::with_capacity(2);
        assert!(reactor.add(item(0, 5)).is_ok());
        assert!(reactor.add(item(1, 5)).is_ok());
        assert!(reactor.is_full());
        assert_eq!(reactor.len(), 2);
    }

    #[test]
    fn test_queue_tick_returns_finished_in_order() {
        let mut queue = ProductionQueue::unbounded();
        queue.add(item(0, 2)).unwrap();
        queue.add(item(1, 1)).unwrap();
        queue.add(item(2, 2)).unwrap();

        let first = queue.tick(false);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].action_index, 1);

        let second = queue.tick(false);
        let indices: Vec<_> = second.iter().map(|i| i.action_index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_contains() {
        let mut queue = ProductionQueue::new();
        queue.add(item(0, 5)).unwrap();
        assert!(queue.contains("Marine"));
        assert!(!queue.contains("Marauder"));
        queue.tick(false);
        assert!(queue.contains("Marine"));
    }
}
