//! Candidate resolution: which other nodes a port could still be linked to.
//!
//! A candidate for an input port is any other node with an output port for
//! the same product that is not already linked to this input; outputs are
//! the mirror image. Results follow node creation order and are recomputed
//! from the link registry on every call.

use crate::graph::{FlowGraph, GraphError};
use crate::id::*;

impl FlowGraph {
    /// Nodes that could still feed `node`'s `product` input.
    pub fn sources_for(&self, node: NodeId, product: ProductId) -> Result<Vec<NodeId>, GraphError> {
        self.candidates(node, Direction::Input, product)
    }

    /// Nodes that could still take `node`'s `product` output.
    pub fn targets_for(&self, node: NodeId, product: ProductId) -> Result<Vec<NodeId>, GraphError> {
        self.candidates(node, Direction::Output, product)
    }

    /// Candidates for the port on `direction` side of `node`. Empty when
    /// the node has no such port; only an unknown node is an error.
    pub fn candidates(
        &self,
        node: NodeId,
        direction: Direction,
        product: ProductId,
    ) -> Result<Vec<NodeId>, GraphError> {
        if !self.get_node(node)?.has_port(direction, product) {
            return Ok(Vec::new());
        }
        Ok(self.candidate_iter(node, direction, product).collect())
    }

    pub(crate) fn candidate_iter(
        &self,
        node: NodeId,
        direction: Direction,
        product: ProductId,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes()
            .filter(move |other| {
                other.id() != node && other.has_port(direction.opposite(), product)
            })
            .filter(move |other| {
                let (source, target) = match direction {
                    Direction::Input => (other.id(), node),
                    Direction::Output => (node, other.id()),
                };
                self.links().find(source, target, product).is_none()
            })
            .map(|other| other.id())
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::GraphError;
    use crate::id::Direction;
    use crate::quantity::qty;
    use crate::test_utils::*;

    #[test]
    fn sources_follow_creation_order() {
        let (mut graph, fx) = fixture_graph();
        let smelter = graph.add_node(fx.smelt_iron).unwrap();
        let mine_a = graph.add_node(fx.mine_ore).unwrap();
        let mine_b = graph.add_node(fx.mine_ore).unwrap();
        assert_eq!(graph.sources_for(smelter, fx.iron_ore).unwrap(), vec![mine_a, mine_b]);
    }

    #[test]
    fn linked_nodes_are_excluded() {
        let (mut graph, fx) = fixture_graph();
        let mine_a = graph.add_node(fx.mine_ore).unwrap();
        let mine_b = graph.add_node(fx.mine_ore).unwrap();
        let smelter = graph.add_node(fx.smelt_iron).unwrap();
        graph.add_edge(mine_a, fx.iron_ore, smelter, qty(1.0)).unwrap();

        assert_eq!(graph.sources_for(smelter, fx.iron_ore).unwrap(), vec![mine_b]);
        let other_smelter = graph.add_node(fx.smelt_iron).unwrap();
        assert_eq!(
            graph.targets_for(mine_a, fx.iron_ore).unwrap(),
            vec![other_smelter]
        );
    }

    #[test]
    fn node_is_never_its_own_candidate() {
        let (mut graph, fx) = fixture_graph();
        let store = graph.add_node(fx.store_plates).unwrap();
        assert!(graph.sources_for(store, fx.iron_plate).unwrap().is_empty());
        assert!(graph.targets_for(store, fx.iron_plate).unwrap().is_empty());

        let other = graph.add_node(fx.store_plates).unwrap();
        assert_eq!(graph.sources_for(store, fx.iron_plate).unwrap(), vec![other]);
        assert_eq!(graph.targets_for(other, fx.iron_plate).unwrap(), vec![store]);
    }

    #[test]
    fn fully_exported_producers_stay_candidates() {
        let (mut graph, fx) = fixture_graph();
        let smelter = graph.add_node(fx.smelt_iron).unwrap();
        let press_a = graph.add_node(fx.press_gear).unwrap();
        let press_b = graph.add_node(fx.press_gear).unwrap();
        graph.add_edge(smelter, fx.iron_plate, press_a, qty(1.0)).unwrap();
        assert_eq!(graph.sources_for(press_b, fx.iron_plate).unwrap(), vec![smelter]);
    }

    #[test]
    fn missing_port_is_empty_unknown_node_is_error() {
        let (mut graph, fx) = fixture_graph();
        let smelter = graph.add_node(fx.smelt_iron).unwrap();
        graph.add_node(fx.store_plates).unwrap();
        assert_eq!(graph.sources_for(smelter, fx.iron_plate), Ok(vec![]));
        assert_eq!(
            graph.candidates(smelter, Direction::Output, fx.iron_ore),
            Ok(vec![])
        );
        graph.remove_node(smelter).unwrap();
        assert_eq!(
            graph.targets_for(smelter, fx.iron_plate),
            Err(GraphError::NodeNotFound(smelter))
        );
    }
}
