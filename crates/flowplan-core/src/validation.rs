//! Invariant audit for debugging and tests.
//!
//! [`audit`] recomputes everything the mutator maintains incrementally and
//! reports each place where the stored state disagrees.

use crate::graph::FlowGraph;
use crate::id::*;
use crate::quantity::Quantity;
use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Violation types
// ---------------------------------------------------------------------------

/// One divergence between stored and recomputed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Input `imported` is not the sum of incoming link quantities.
    ImportedMismatch {
        node: NodeId,
        product: ProductId,
        stored: Quantity,
        expected: Quantity,
    },
    /// Output `exported` is not the sum of outgoing link quantities.
    ExportedMismatch {
        node: NodeId,
        product: ProductId,
        stored: Quantity,
        expected: Quantity,
    },
    /// A port carries more than its quantity.
    OverCap {
        node: NodeId,
        direction: Direction,
        product: ProductId,
        filled: Quantity,
        quantity: Quantity,
    },
    /// Link endpoint node or port does not exist.
    DanglingLink(EdgeId),
    SelfLoop(EdgeId),
    NonPositiveLink { edge: EdgeId, quantity: Quantity },
    /// Two links join the same ports.
    DuplicateLink { edge: EdgeId, first: EdgeId },
    /// Stored `maxed` differs from the derived value.
    MaxedMismatch {
        node: NodeId,
        direction: Direction,
        product: ProductId,
        stored: bool,
    },
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// Check every graph invariant from scratch. An empty result means the
/// graph is consistent.
pub fn audit(graph: &FlowGraph) -> Vec<Violation> {
    let mut violations = Vec::new();
    audit_links(graph, &mut violations);
    audit_ports(graph, &mut violations);
    violations
}

fn audit_links(graph: &FlowGraph, out: &mut Vec<Violation>) {
    let mut seen: HashMap<(NodeId, NodeId, ProductId), EdgeId> = HashMap::new();

    for (edge, link) in graph.links().iter() {
        let source_ok = graph
            .get_node(link.source)
            .is_ok_and(|n| n.output(link.product).is_some());
        let target_ok = graph
            .get_node(link.target)
            .is_ok_and(|n| n.input(link.product).is_some());
        if !source_ok || !target_ok {
            out.push(Violation::DanglingLink(edge));
        }
        if link.source == link.target {
            out.push(Violation::SelfLoop(edge));
        }
        if link.quantity <= Quantity::ZERO {
            out.push(Violation::NonPositiveLink {
                edge,
                quantity: link.quantity,
            });
        }
        if let Some(&first) = seen.get(&(link.source, link.target, link.product)) {
            out.push(Violation::DuplicateLink { edge, first });
        } else {
            seen.insert((link.source, link.target, link.product), edge);
        }
    }
}

fn audit_ports(graph: &FlowGraph, out: &mut Vec<Violation>) {
    // Sums straight from the edge set, not from the adjacency lists.
    let mut inflow: BTreeMap<(NodeId, ProductId), Quantity> = BTreeMap::new();
    let mut outflow: BTreeMap<(NodeId, ProductId), Quantity> = BTreeMap::new();
    for (_, link) in graph.links().iter() {
        let sum = inflow.entry((link.target, link.product)).or_default();
        *sum = sum.saturating_add(link.quantity);
        let sum = outflow.entry((link.source, link.product)).or_default();
        *sum = sum.saturating_add(link.quantity);
    }

    for node in graph.nodes() {
        let id = node.id();
        for (&product, port) in node.inputs() {
            let expected = inflow.get(&(id, product)).copied().unwrap_or_default();
            if port.imported() != expected {
                out.push(Violation::ImportedMismatch {
                    node: id,
                    product,
                    stored: port.imported(),
                    expected,
                });
            }
            if port.imported() > port.quantity() {
                out.push(Violation::OverCap {
                    node: id,
                    direction: Direction::Input,
                    product,
                    filled: port.imported(),
                    quantity: port.quantity(),
                });
            }
            if graph.derive_maxed(node, Direction::Input, product) != Some(port.maxed()) {
                out.push(Violation::MaxedMismatch {
                    node: id,
                    direction: Direction::Input,
                    product,
                    stored: port.maxed(),
                });
            }
        }
        for (&product, port) in node.outputs() {
            let expected = outflow.get(&(id, product)).copied().unwrap_or_default();
            if port.exported() != expected {
                out.push(Violation::ExportedMismatch {
                    node: id,
                    product,
                    stored: port.exported(),
                    expected,
                });
            }
            if !port.is_unbounded() && port.exported() > port.quantity() {
                out.push(Violation::OverCap {
                    node: id,
                    direction: Direction::Output,
                    product,
                    filled: port.exported(),
                    quantity: port.quantity(),
                });
            }
            if graph.derive_maxed(node, Direction::Output, product) != Some(port.maxed()) {
                out.push(Violation::MaxedMismatch {
                    node: id,
                    direction: Direction::Output,
                    product,
                    stored: port.maxed(),
                });
            }
        }
    }
}
