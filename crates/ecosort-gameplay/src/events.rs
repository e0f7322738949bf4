//! Event bus for inter-system communication.

use crossbeam_channel::{bounded, Receiver, Sender};
use ecosort_common::{Category, EntityId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::progress::GameState;

/// Event types that can be sent through the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A trash item or bin appeared in the registry
    EntitySpawned {
        /// Entity ID
        entity_id: EntityId,
        /// Category tag
        category: Category,
        /// Whether it is a bin (otherwise trash)
        is_bin: bool,
    },
    /// The player picked up an item
    TrashPickedUp {
        /// Item picked up
        entity_id: EntityId,
        /// Item category
        category: Category,
    },
    /// The carried item went into a bin
    TrashDeposited {
        /// Item consumed
        entity_id: EntityId,
        /// Item category
        item_category: Category,
        /// Category of the bin used
        bin_category: Category,
        /// Whether categories matched
        correct: bool,
    },
    /// Score changed
    ScoreChanged {
        /// New score
        score: i32,
        /// Signed change
        delta: i32,
    },
    /// The game reached a terminal state
    GameEnded {
        /// Final state
        state: GameState,
        /// Final score
        score: i32,
    },
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<GameEvent>,
    /// Receiver for collecting events
    receiver: Receiver<GameEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    ///
    /// Never blocks. Returns `false` when the bus is full and the event
    /// was dropped; consumers are expected to drain every frame.
    pub fn publish(&self, event: GameEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                warn!(capacity = self.capacity, event = ?e.into_inner(), "Event bus full, dropping event");
                false
            },
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<GameEvent> {
        self.sender.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_returns_events_in_order() {
        let bus = EventBus::new(4);
        bus.publish(GameEvent::ScoreChanged { score: 1, delta: 1 });
        bus.publish(GameEvent::ScoreChanged { score: 0, delta: -1 });

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], GameEvent::ScoreChanged { score: 0, delta: -1 });
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops_events() {
        let bus = EventBus::new(1);
        assert!(bus.publish(GameEvent::ScoreChanged { score: 1, delta: 1 }));
        assert!(!bus.publish(GameEvent::ScoreChanged { score: 2, delta: 1 }));
        assert_eq!(bus.pending_count(), 1);

        bus.drain();
        assert!(bus.publish(GameEvent::ScoreChanged { score: 3, delta: 1 }));
    }
}
