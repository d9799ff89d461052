//! Read-only views for rendering.
//!
//! Views are owned copies, so a renderer can hold them across mutations.
//! `satisfied` is computed here on read; `maxed` is copied from the stored
//! flag the mutator keeps current.

use crate::graph::{FlowGraph, GraphError};
use crate::id::*;
use crate::quantity::Quantity;
use serde::Serialize;
use std::collections::BTreeMap;

/// Snapshot of one port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortView {
    pub product: ProductId,
    pub name: String,
    pub quantity: Quantity,
    /// `imported` for inputs, `exported` for outputs.
    pub filled: Quantity,
    pub unbounded: bool,
    pub maxed: bool,
    pub satisfied: bool,
}

/// Snapshot of a node's ports and machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub recipe: RecipeId,
    pub machine: MachineId,
    pub machine_name: String,
    pub inputs: BTreeMap<ProductId, PortView>,
    pub outputs: BTreeMap<ProductId, PortView>,
}

impl NodeView {
    /// Every port on the node reports satisfied.
    pub fn is_satisfied(&self) -> bool {
        self.inputs
            .values()
            .chain(self.outputs.values())
            .all(|p| p.satisfied)
    }

    /// Inputs sorted by product name, the order a node card lists them in.
    pub fn inputs_by_name(&self) -> Vec<&PortView> {
        sorted_by_name(&self.inputs)
    }

    /// Outputs sorted by product name.
    pub fn outputs_by_name(&self) -> Vec<&PortView> {
        sorted_by_name(&self.outputs)
    }
}

fn sorted_by_name(ports: &BTreeMap<ProductId, PortView>) -> Vec<&PortView> {
    let mut list: Vec<&PortView> = ports.values().collect();
    list.sort_by(|a, b| a.name.cmp(&b.name).then(a.product.cmp(&b.product)));
    list
}

/// Names one port in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PortRef {
    pub node: NodeId,
    pub direction: Direction,
    pub product: ProductId,
}

impl FlowGraph {
    /// Snapshot a node for rendering.
    pub fn node_view(&self, node: NodeId) -> Result<NodeView, GraphError> {
        let n = self.get_node(node)?;
        let catalog = self.catalog();
        let machine = catalog
            .get_machine(n.machine())
            .ok_or(GraphError::MachineNotFound(n.machine()))?;

        let inputs = n
            .inputs()
            .iter()
            .map(|(&product, port)| {
                let view = PortView {
                    product,
                    name: catalog.product_name(product),
                    quantity: port.quantity(),
                    filled: port.imported(),
                    unbounded: false,
                    maxed: port.maxed(),
                    satisfied: port.is_satisfied(machine),
                };
                (product, view)
            })
            .collect();
        let outputs = n
            .outputs()
            .iter()
            .map(|(&product, port)| {
                let view = PortView {
                    product,
                    name: catalog.product_name(product),
                    quantity: port.quantity(),
                    filled: port.exported(),
                    unbounded: port.is_unbounded(),
                    maxed: port.maxed(),
                    satisfied: port.is_satisfied(machine),
                };
                (product, view)
            })
            .collect();

        Ok(NodeView {
            id: node,
            recipe: n.recipe(),
            machine: n.machine(),
            machine_name: machine.name.clone(),
            inputs,
            outputs,
        })
    }

    /// Every port that does not currently report satisfied, nodes in
    /// creation order, inputs before outputs.
    pub fn unsatisfied_ports(&self) -> Vec<PortRef> {
        let catalog = self.catalog();
        let mut out = Vec::new();
        for node in self.nodes() {
            let Some(machine) = catalog.get_machine(node.machine()) else {
                continue;
            };
            for (&product, port) in node.inputs() {
                if !port.is_satisfied(machine) {
                    out.push(PortRef {
                        node: node.id(),
                        direction: Direction::Input,
                        product,
                    });
                }
            }
            for (&product, port) in node.outputs() {
                if !port.is_satisfied(machine) {
                    out.push(PortRef {
                        node: node.id(),
                        direction: Direction::Output,
                        product,
                    });
                }
            }
        }
        out
    }
}
