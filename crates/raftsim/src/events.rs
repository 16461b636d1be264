//! Notification queue for cross-system events.
//!
//! The core pushes events as it mutates; collaborators (building UI, loot
//! spawner, VFX, replication) drain the queue after each tick. This replaces
//! per-event signal dispatch with an explicit, inspectable buffer.

use crate::tile::TileId;
use serde::{Deserialize, Serialize};

/// What dealt the damage. Carried through to loot/VFX collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageCause {
    Shark,
    Collision,
    Scuttle,
}

/// Events emitted by the raft aggregate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RaftEvent {
    TileAdded {
        id: TileId,
        grid_pos: (i32, i32),
    },
    TileRemoved {
        id: TileId,
        grid_pos: (i32, i32),
    },
    TileDestroyed {
        id: TileId,
        grid_pos: (i32, i32),
        cause: DamageCause,
    },
    /// Stability state machine transition (true = back to stable).
    StabilityChanged {
        stable: bool,
    },
    RaftDestroyed,
}

/// FIFO event buffer drained by collaborators.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<RaftEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: RaftEvent) {
        self.events.push(event);
    }

    /// Take all pending events, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<RaftEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Peek without draining.
    pub fn pending(&self) -> &[RaftEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_queue_in_order() {
        let mut queue = EventQueue::default();
        queue.push(RaftEvent::TileAdded { id: 0, grid_pos: (0, 0) });
        queue.push(RaftEvent::RaftDestroyed);

        let events = queue.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], RaftEvent::RaftDestroyed);
        assert!(queue.is_empty());
    }
}
