//! Shared fixtures for unit tests, integration tests and benches.

use crate::catalog::{Catalog, CatalogBuilder, Maintenance, MaintenanceKind, RecipeEntry};
use crate::graph::FlowGraph;
use crate::id::*;
use crate::quantity::qty;
use std::sync::Arc;

/// IDs registered by [`fixture_catalog`].
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub iron_ore: ProductId,
    pub iron_plate: ProductId,
    pub gear: ProductId,
    pub motor: ProductId,
    pub concrete: ProductId,
    pub mine: MachineId,
    pub smelter: MachineId,
    pub press: MachineId,
    pub assembler: MachineId,
    pub storage: MachineId,
    /// Mine, unbounded ore output.
    pub mine_ore: RecipeId,
    /// 2 ore -> 1 plate.
    pub smelt_iron: RecipeId,
    /// 2 plates -> 1 gear.
    pub press_gear: RecipeId,
    /// 1 gear + 1 plate -> 1 motor.
    pub assemble_motor: RecipeId,
    /// Storage, 10 plates in and out.
    pub store_plates: RecipeId,
}

/// A small iron chain: mine, smelter, press, assembler and a plate store.
pub fn fixture_catalog() -> (Catalog, Fixture) {
    let mut b = CatalogBuilder::new();
    let iron_ore = b.register_product("iron_ore", "Iron Ore");
    let iron_plate = b.register_product("iron_plate", "Iron Plate");
    let gear = b.register_product("gear", "Gear");
    let motor = b.register_product("motor", "Motor");
    let concrete = b.register_product("concrete", "Concrete");

    let mine = b.register_machine("mine", "Mine");
    let smelter = b.register_machine("smelter", "Smelter");
    let press = b.register_machine("press", "Press");
    let assembler = b.register_machine("assembler", "Assembler");
    let storage = b.register_machine("storage", "Storage");

    b.mutate_machine("mine", |m| {
        m.is_mine = true;
        m.workers = 4;
        m.build_costs = vec![RecipeEntry::new(concrete, qty(20.0))];
    })
    .unwrap();
    b.mutate_machine("smelter", |m| {
        m.workers = 6;
        m.electricity = qty(0.5);
        m.build_costs = vec![RecipeEntry::new(concrete, qty(10.0))];
        m.maintenance = Some(Maintenance {
            kind: MaintenanceKind::Tier1,
            quantity: qty(1.5),
        });
    })
    .unwrap();
    b.mutate_machine("press", |m| {
        m.workers = 2;
        m.electricity = qty(0.25);
        m.maintenance = Some(Maintenance {
            kind: MaintenanceKind::Tier2,
            quantity: qty(0.5),
        });
    })
    .unwrap();
    b.mutate_machine("storage", |m| m.is_storage = true).unwrap();

    let mine_ore = b.register_recipe(
        "mine_ore",
        mine,
        vec![],
        vec![RecipeEntry::new(iron_ore, qty(0.0))],
    );
    let smelt_iron = b.register_recipe(
        "smelt_iron",
        smelter,
        vec![RecipeEntry::new(iron_ore, qty(2.0))],
        vec![RecipeEntry::new(iron_plate, qty(1.0))],
    );
    let press_gear = b.register_recipe(
        "press_gear",
        press,
        vec![RecipeEntry::new(iron_plate, qty(2.0))],
        vec![RecipeEntry::new(gear, qty(1.0))],
    );
    let assemble_motor = b.register_recipe(
        "assemble_motor",
        assembler,
        vec![
            RecipeEntry::new(iron_plate, qty(1.0)),
            RecipeEntry::new(gear, qty(1.0)),
        ],
        vec![RecipeEntry::new(motor, qty(1.0))],
    );
    let store_plates = b.register_recipe(
        "store_plates",
        storage,
        vec![RecipeEntry::new(iron_plate, qty(10.0))],
        vec![RecipeEntry::new(iron_plate, qty(10.0))],
    );

    let fx = Fixture {
        iron_ore,
        iron_plate,
        gear,
        motor,
        concrete,
        mine,
        smelter,
        press,
        assembler,
        storage,
        mine_ore,
        smelt_iron,
        press_gear,
        assemble_motor,
        store_plates,
    };
    (b.build().unwrap(), fx)
}

/// An empty graph over [`fixture_catalog`].
pub fn fixture_graph() -> (FlowGraph, Fixture) {
    let (catalog, fx) = fixture_catalog();
    (FlowGraph::new(Arc::new(catalog)), fx)
}

/// A graph with `chains` independent mine -> smelter -> press chains,
/// fully linked.
pub fn chain_graph(chains: usize) -> (FlowGraph, Fixture) {
    let (mut graph, fx) = fixture_graph();
    for _ in 0..chains {
        let mine = graph.add_node(fx.mine_ore).unwrap();
        let smelter = graph.add_node(fx.smelt_iron).unwrap();
        let press = graph.add_node(fx.press_gear).unwrap();
        graph.add_edge(mine, fx.iron_ore, smelter, qty(2.0)).unwrap();
        graph.add_edge(smelter, fx.iron_plate, press, qty(1.0)).unwrap();
    }
    (graph, fx)
}
