use crate::catalog::MaintenanceKind;
use crate::graph::FlowGraph;
use crate::id::ProductId;
use crate::quantity::Quantity;
use serde::Serialize;
use std::collections::BTreeMap;

/// Machine costs summed over every placed node. Sums saturate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanCosts {
    pub machines: usize,
    pub build_costs: BTreeMap<ProductId, Quantity>,
    pub workers: u64,
    pub maintenance: BTreeMap<MaintenanceKind, Quantity>,
    pub electricity: Quantity,
    pub unity: Quantity,
    pub computing: Quantity,
}

impl FlowGraph {
    /// Total machine costs of the plan. Nodes whose machine is missing from
    /// the catalog contribute nothing.
    pub fn plan_costs(&self) -> PlanCosts {
        let catalog = self.catalog();
        let mut totals = PlanCosts::default();

        for node in self.nodes() {
            let Some(machine) = catalog.get_machine(node.machine()) else {
                continue;
            };
            totals.machines += 1;
            for entry in &machine.build_costs {
                let sum = totals.build_costs.entry(entry.product).or_default();
                *sum = sum.saturating_add(entry.quantity);
            }
            totals.workers += u64::from(machine.workers);
            if let Some(m) = machine.maintenance {
                let sum = totals.maintenance.entry(m.kind).or_default();
                *sum = sum.saturating_add(m.quantity);
            }
            totals.electricity = totals.electricity.saturating_add(machine.electricity);
            totals.unity = totals.unity.saturating_add(machine.unity);
            totals.computing = totals.computing.saturating_add(machine.computing);
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::qty;
    use crate::test_utils::*;

    #[test]
    fn empty_plan_costs_nothing() {
        let (graph, _) = fixture_graph();
        assert_eq!(graph.plan_costs(), PlanCosts::default());
    }

    #[test]
    fn costs_sum_per_node() {
        let (mut graph, fx) = fixture_graph();
        graph.add_node(fx.mine_ore).unwrap();
        graph.add_node(fx.smelt_iron).unwrap();
        graph.add_node(fx.smelt_iron).unwrap();
        graph.add_node(fx.press_gear).unwrap();

        let costs = graph.plan_costs();
        assert_eq!(costs.machines, 4);
        assert_eq!(costs.workers, 4 + 6 + 6 + 2);
        assert_eq!(costs.build_costs[&fx.concrete], qty(40.0));
        assert_eq!(costs.maintenance[&MaintenanceKind::Tier1], qty(3.0));
        assert_eq!(costs.maintenance[&MaintenanceKind::Tier2], qty(0.5));
        assert_eq!(costs.electricity, qty(1.25));
        assert_eq!(costs.unity, Quantity::ZERO);
    }

    #[test]
    fn removed_nodes_stop_counting() {
        let (mut graph, fx) = fixture_graph();
        let smelter = graph.add_node(fx.smelt_iron).unwrap();
        graph.remove_node(smelter).unwrap();
        assert_eq!(graph.plan_costs().machines, 0);
    }
}
