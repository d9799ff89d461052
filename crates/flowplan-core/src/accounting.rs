//! Port accounting: re-derivation of the stored `maxed` flags.
//!
//! `maxed` depends on the port's own totals and on whether any candidate is
//! left, and candidates depend on every node carrying the same product. So
//! after a mutation the graph re-derives every port of every affected
//! product, not only the ports the mutation touched.

use crate::event::GraphEvent;
use crate::graph::FlowGraph;
use crate::id::*;
use crate::node::ProductionNode;

impl FlowGraph {
    /// What `maxed` should be for a port, given the current links.
    /// `None` if the node has no such port.
    pub fn derive_maxed(
        &self,
        node: &ProductionNode,
        direction: Direction,
        product: ProductId,
    ) -> Option<bool> {
        let has_candidates = || {
            self.candidate_iter(node.id(), direction, product)
                .next()
                .is_some()
        };
        match direction {
            Direction::Input => node
                .input(product)
                .map(|port| port.derive_maxed(has_candidates())),
            Direction::Output => node
                .output(product)
                .map(|port| port.derive_maxed(has_candidates())),
        }
    }

    /// Re-derive `maxed` on every port carrying one of `products`, then
    /// journal a `PortsChanged` for each node whose flags moved or that is
    /// listed in `touched`.
    pub(crate) fn refresh_products(&mut self, products: &[ProductId], touched: &[NodeId]) {
        let mut products = products.to_vec();
        products.sort();
        products.dedup();

        let mut updates: Vec<(NodeId, Direction, ProductId, bool)> = Vec::new();
        for node in self.nodes() {
            for &product in &products {
                for direction in [Direction::Input, Direction::Output] {
                    let current = match direction {
                        Direction::Input => node.input(product).map(|p| p.maxed()),
                        Direction::Output => node.output(product).map(|p| p.maxed()),
                    };
                    let (Some(current), Some(derived)) =
                        (current, self.derive_maxed(node, direction, product))
                    else {
                        continue;
                    };
                    if current != derived {
                        updates.push((node.id(), direction, product, derived));
                    }
                }
            }
        }

        let mut changed: Vec<NodeId> = touched.to_vec();
        for (id, direction, product, maxed) in updates {
            let Some(node) = self.node_mut(id) else {
                continue;
            };
            match direction {
                Direction::Input => {
                    if let Some(port) = node.input_mut(product) {
                        port.set_maxed(maxed);
                    }
                }
                Direction::Output => {
                    if let Some(port) = node.output_mut(product) {
                        port.set_maxed(maxed);
                    }
                }
            }
            changed.push(id);
        }

        let in_order: Vec<NodeId> = self
            .node_ids()
            .iter()
            .copied()
            .filter(|id| changed.contains(id))
            .collect();
        for node in in_order {
            self.push_event(GraphEvent::PortsChanged { node });
        }
    }

    /// Reset a port's totals to the sums held by the link registry.
    pub(crate) fn resync_port_totals(&mut self, node: NodeId, product: ProductId) {
        let inflow = self.links().inflow(node, product);
        let outflow = self.links().outflow(node, product);
        let Some(node) = self.node_mut(node) else {
            return;
        };
        if let Some(port) = node.input_mut(product) {
            port.set_imported(inflow);
        }
        if let Some(port) = node.output_mut(product) {
            port.set_exported(outflow);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::id::Direction;
    use crate::quantity::qty;
    use crate::test_utils::*;

    #[test]
    fn lone_node_ports_are_maxed() {
        let (mut graph, fx) = fixture_graph();
        let smelter = graph.add_node(fx.smelt_iron).unwrap();
        let node = graph.get_node(smelter).unwrap();
        assert!(node.input(fx.iron_ore).unwrap().maxed());
        assert!(node.output(fx.iron_plate).unwrap().maxed());
    }

    #[test]
    fn new_producer_opens_consumer_port() {
        let (mut graph, fx) = fixture_graph();
        let smelter = graph.add_node(fx.smelt_iron).unwrap();
        let mine = graph.add_node(fx.mine_ore).unwrap();
        assert!(!graph.get_node(smelter).unwrap().input(fx.iron_ore).unwrap().maxed());
        assert!(!graph.get_node(mine).unwrap().output(fx.iron_ore).unwrap().maxed());

        graph.remove_node(mine).unwrap();
        assert!(graph.get_node(smelter).unwrap().input(fx.iron_ore).unwrap().maxed());
    }

    #[test]
    fn derive_maxed_matches_stored_flags() {
        let (mut graph, fx) = fixture_graph();
        let mine = graph.add_node(fx.mine_ore).unwrap();
        let smelter = graph.add_node(fx.smelt_iron).unwrap();
        graph.add_edge(mine, fx.iron_ore, smelter, qty(1.0)).unwrap();

        for node in graph.nodes() {
            for &product in node.inputs().keys() {
                assert_eq!(
                    graph.derive_maxed(node, Direction::Input, product),
                    Some(node.input(product).unwrap().maxed())
                );
            }
        }
        let node = graph.get_node(mine).unwrap();
        assert_eq!(graph.derive_maxed(node, Direction::Input, fx.iron_ore), None);
    }

    #[test]
    fn partial_supply_keeps_port_open_while_candidates_remain() {
        let (mut graph, fx) = fixture_graph();
        let mine_a = graph.add_node(fx.mine_ore).unwrap();
        graph.add_node(fx.mine_ore).unwrap();
        let smelter = graph.add_node(fx.smelt_iron).unwrap();
        graph.add_edge(mine_a, fx.iron_ore, smelter, qty(1.0)).unwrap();
        assert!(!graph.get_node(smelter).unwrap().input(fx.iron_ore).unwrap().maxed());
    }
}
