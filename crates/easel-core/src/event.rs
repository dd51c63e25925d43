//! Scene lifecycle events.
//!
//! Mutations push `SceneEvent` values onto a queue owned by the scene; the
//! embedder drains it once per turn of its own loop. Events are plain
//! values, so a consumer reacting to one cannot invalidate the iteration
//! that delivered it.

use crate::id::NodeId;
use petgraph::graph::NodeIndex;

/// What happened to a node. Transform events (`Moving`, `Scaling`,
/// `Rotating`, `Skewing`) fire on every pointer step of an interactive
/// session; `Modified` fires once when the session commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Removed,
    Modified,
    Selected,
    Deselected,
    Moving,
    Scaling,
    Rotating,
    Skewing,
    Layout,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneEvent {
    pub kind: EventKind,
    /// Arena handle of the node the event is about.
    pub target: NodeIndex,
    /// Interned name of the target, stable across arena reuse.
    pub name: NodeId,
}

/// Drainable event queue. Push order is delivery order.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Vec<SceneEvent>,
}

impl EventQueue {
    pub fn push(&mut self, kind: EventKind, target: NodeIndex, name: NodeId) {
        self.pending.push(SceneEvent { kind, target, name });
    }

    /// Take every pending event, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_queue() {
        let mut q = EventQueue::default();
        let idx = NodeIndex::new(0);
        q.push(EventKind::Added, idx, NodeId::named("a"));
        q.push(EventKind::Moving, idx, NodeId::named("a"));
        let drained = q.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind, EventKind::Added);
        assert_eq!(drained[1].kind, EventKind::Moving);
        assert!(q.is_empty());
    }
}
