//! Change journal for committed graph mutations.
//!
//! Every successful mutation appends one or more [`GraphEvent`]s to a bounded
//! ring buffer. A renderer drains the journal to learn which nodes need to be
//! redrawn. Rejected mutations append nothing.

use crate::id::*;
use crate::quantity::Quantity;

/// Default journal capacity used by [`crate::graph::FlowGraph::new`].
pub const DEFAULT_JOURNAL_CAPACITY: usize = 1024;

/// A committed change to the flow graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    NodeAdded {
        node: NodeId,
        recipe: RecipeId,
    },
    NodeRemoved {
        node: NodeId,
    },
    EdgeAdded {
        edge: EdgeId,
        source: NodeId,
        target: NodeId,
        product: ProductId,
        quantity: Quantity,
    },
    EdgeRemoved {
        edge: EdgeId,
    },
    EdgeRequantified {
        edge: EdgeId,
        from: Quantity,
        to: Quantity,
    },
    /// A port's fulfilled amount or `maxed` flag changed on this node.
    PortsChanged {
        node: NodeId,
    },
}

/// Discriminant tag for events, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NodeAdded,
    NodeRemoved,
    EdgeAdded,
    EdgeRemoved,
    EdgeRequantified,
    PortsChanged,
}

impl GraphEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GraphEvent::NodeAdded { .. } => EventKind::NodeAdded,
            GraphEvent::NodeRemoved { .. } => EventKind::NodeRemoved,
            GraphEvent::EdgeAdded { .. } => EventKind::EdgeAdded,
            GraphEvent::EdgeRemoved { .. } => EventKind::EdgeRemoved,
            GraphEvent::EdgeRequantified { .. } => EventKind::EdgeRequantified,
            GraphEvent::PortsChanged { .. } => EventKind::PortsChanged,
        }
    }
}

/// A pre-allocated ring buffer of events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug, Clone)]
pub struct EventJournal {
    events: Vec<Option<GraphEvent>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written, including dropped ones.
    total_written: u64,
    dropped: u64,
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::new(DEFAULT_JOURNAL_CAPACITY)
    }
}

impl EventJournal {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
            dropped: 0,
        }
    }

    pub(crate) fn push(&mut self, event: GraphEvent) {
        self.events[self.head] = Some(event);
        if self.len < self.capacity() {
            self.len += 1;
        } else {
            self.dropped += 1;
        }
        self.head = (self.head + 1) % self.capacity();
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Number of events lost because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Iterate from oldest to newest without consuming.
    pub fn iter(&self) -> impl Iterator<Item = &GraphEvent> {
        let start = if self.len < self.capacity() { 0 } else { self.head };
        let cap = self.capacity();
        (0..self.len).filter_map(move |i| self.events[(start + i) % cap].as_ref())
    }

    /// Remove and return every buffered event, oldest first.
    pub fn drain(&mut self) -> Vec<GraphEvent> {
        let start = if self.len < self.capacity() { 0 } else { self.head };
        let cap = self.capacity();
        let mut out = Vec::with_capacity(self.len);
        for i in 0..self.len {
            if let Some(event) = self.events[(start + i) % cap].take() {
                out.push(event);
            }
        }
        self.head = 0;
        self.len = 0;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn node_ids(count: usize) -> Vec<NodeId> {
        let mut sm: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..count).map(|_| sm.insert(())).collect()
    }

    #[test]
    fn push_and_drain_in_order() {
        let ids = node_ids(3);
        let mut journal = EventJournal::new(8);
        for &node in &ids {
            journal.push(GraphEvent::NodeRemoved { node });
        }
        assert_eq!(journal.len(), 3);
        let drained = journal.drain();
        assert_eq!(
            drained,
            ids.iter()
                .map(|&node| GraphEvent::NodeRemoved { node })
                .collect::<Vec<_>>()
        );
        assert!(journal.is_empty());
        assert_eq!(journal.total_written(), 3);
    }

    #[test]
    fn full_buffer_drops_oldest() {
        let ids = node_ids(5);
        let mut journal = EventJournal::new(3);
        for &node in &ids {
            journal.push(GraphEvent::PortsChanged { node });
        }
        assert_eq!(journal.len(), 3);
        assert_eq!(journal.dropped_count(), 2);
        let kept: Vec<NodeId> = journal
            .iter()
            .map(|e| match e {
                GraphEvent::PortsChanged { node } => *node,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(kept, ids[2..].to_vec());
        assert_eq!(journal.drain().len(), 3);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let ids = node_ids(1);
        let mut journal = EventJournal::new(0);
        assert_eq!(journal.capacity(), 1);
        journal.push(GraphEvent::NodeRemoved { node: ids[0] });
        assert_eq!(journal.iter().next().map(GraphEvent::kind), Some(EventKind::NodeRemoved));
    }
}
