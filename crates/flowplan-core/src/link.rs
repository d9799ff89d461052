//! Link registry: the product edges between an output port and an input port.
//!
//! Edges live in a `SlotMap`; per-node adjacency lives in a `SecondaryMap`
//! keyed by `NodeId` so it stays in sync with the node store. Nothing here
//! validates capacities; the graph mutator does that before calling in.

use crate::id::*;
use crate::quantity::Quantity;
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};

/// A directed, product-typed flow from `source`'s output port to `target`'s
/// input port for the same product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
    pub product: ProductId,
    pub quantity: Quantity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct NodeAdjacency {
    /// Edges whose target is this node.
    incoming: Vec<EdgeId>,
    /// Edges whose source is this node.
    outgoing: Vec<EdgeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkRegistry {
    edges: SlotMap<EdgeId, Link>,
    adjacency: SecondaryMap<NodeId, NodeAdjacency>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach_node(&mut self, node: NodeId) {
        self.adjacency.insert(node, NodeAdjacency::default());
    }

    /// Drop the node's adjacency and every edge touching it. Returns the
    /// removed edges so the caller can re-derive the neighbours.
    pub(crate) fn detach_node(&mut self, node: NodeId) -> Vec<(EdgeId, Link)> {
        let touching: Vec<EdgeId> = match self.adjacency.get(node) {
            Some(adj) => adj.incoming.iter().chain(adj.outgoing.iter()).copied().collect(),
            None => return Vec::new(),
        };

        let removed: Vec<(EdgeId, Link)> = touching
            .into_iter()
            .filter_map(|edge| self.remove(edge).map(|link| (edge, link)))
            .collect();
        self.adjacency.remove(node);
        removed
    }

    pub(crate) fn insert(&mut self, link: Link) -> EdgeId {
        let (source, target) = (link.source, link.target);
        let edge = self.edges.insert(link);
        if let Some(adj) = self.adjacency.get_mut(source) {
            adj.outgoing.push(edge);
        }
        if let Some(adj) = self.adjacency.get_mut(target) {
            adj.incoming.push(edge);
        }
        edge
    }

    pub(crate) fn remove(&mut self, edge: EdgeId) -> Option<Link> {
        let link = self.edges.remove(edge)?;
        if let Some(adj) = self.adjacency.get_mut(link.source) {
            adj.outgoing.retain(|&e| e != edge);
        }
        if let Some(adj) = self.adjacency.get_mut(link.target) {
            adj.incoming.retain(|&e| e != edge);
        }
        Some(link)
    }

    pub(crate) fn set_quantity(&mut self, edge: EdgeId, quantity: Quantity) {
        if let Some(link) = self.edges.get_mut(edge) {
            link.quantity = quantity;
        }
    }

    pub fn get(&self, edge: EdgeId) -> Option<&Link> {
        self.edges.get(edge)
    }

    pub fn contains(&self, edge: EdgeId) -> bool {
        self.edges.contains_key(edge)
    }

    /// Edges arriving at `node`, in insertion order.
    pub fn incoming(&self, node: NodeId) -> &[EdgeId] {
        self.adjacency
            .get(node)
            .map(|adj| adj.incoming.as_slice())
            .unwrap_or(&[])
    }

    /// Edges leaving `node`, in insertion order.
    pub fn outgoing(&self, node: NodeId) -> &[EdgeId] {
        self.adjacency
            .get(node)
            .map(|adj| adj.outgoing.as_slice())
            .unwrap_or(&[])
    }

    /// The edge carrying `product` from `source` to `target`, if any.
    pub fn find(&self, source: NodeId, target: NodeId, product: ProductId) -> Option<EdgeId> {
        self.outgoing(source).iter().copied().find(|&edge| {
            self.edges
                .get(edge)
                .is_some_and(|l| l.target == target && l.product == product)
        })
    }

    /// Sum of quantities flowing into `node`'s `product` input.
    pub fn inflow(&self, node: NodeId, product: ProductId) -> Quantity {
        self.incoming(node)
            .iter()
            .filter_map(|&e| self.edges.get(e))
            .filter(|l| l.product == product)
            .map(|l| l.quantity)
            .sum()
    }

    /// Sum of quantities flowing out of `node`'s `product` output.
    pub fn outflow(&self, node: NodeId, product: ProductId) -> Quantity {
        self.outgoing(node)
            .iter()
            .filter_map(|&e| self.edges.get(e))
            .filter(|l| l.product == product)
            .map(|l| l.quantity)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EdgeId, &Link)> {
        self.edges.iter()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
