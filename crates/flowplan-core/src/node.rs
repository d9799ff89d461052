use crate::catalog::RecipeDef;
use crate::id::*;
use crate::port::{InputPort, OutputPort};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A placed recipe instance. The port sets are derived from the recipe when
/// the node is created and never resized afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionNode {
    id: NodeId,
    recipe: RecipeId,
    machine: MachineId,
    inputs: BTreeMap<ProductId, InputPort>,
    outputs: BTreeMap<ProductId, OutputPort>,
}

impl ProductionNode {
    /// Instantiate ports from a recipe. A product listed twice on the same
    /// side becomes a single port carrying the summed quantity.
    pub(crate) fn instantiate(id: NodeId, recipe_id: RecipeId, recipe: &RecipeDef) -> Self {
        let mut inputs: BTreeMap<ProductId, InputPort> = BTreeMap::new();
        for entry in &recipe.inputs {
            let quantity = inputs
                .get(&entry.product)
                .map(|p| p.quantity().saturating_add(entry.quantity))
                .unwrap_or(entry.quantity);
            inputs.insert(entry.product, InputPort::new(entry.product, quantity));
        }

        let mut outputs: BTreeMap<ProductId, OutputPort> = BTreeMap::new();
        for entry in &recipe.outputs {
            let quantity = outputs
                .get(&entry.product)
                .map(|p| p.quantity().saturating_add(entry.quantity))
                .unwrap_or(entry.quantity);
            outputs.insert(entry.product, OutputPort::new(entry.product, quantity));
        }

        Self {
            id,
            recipe: recipe_id,
            machine: recipe.machine,
            inputs,
            outputs,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn recipe(&self) -> RecipeId {
        self.recipe
    }

    pub fn machine(&self) -> MachineId {
        self.machine
    }

    pub fn inputs(&self) -> &BTreeMap<ProductId, InputPort> {
        &self.inputs
    }

    pub fn outputs(&self) -> &BTreeMap<ProductId, OutputPort> {
        &self.outputs
    }

    pub fn input(&self, product: ProductId) -> Option<&InputPort> {
        self.inputs.get(&product)
    }

    pub fn output(&self, product: ProductId) -> Option<&OutputPort> {
        self.outputs.get(&product)
    }

    /// Whether the node has a port for `product` on the given side.
    pub fn has_port(&self, direction: Direction, product: ProductId) -> bool {
        match direction {
            Direction::Input => self.inputs.contains_key(&product),
            Direction::Output => self.outputs.contains_key(&product),
        }
    }

    /// Every product this node touches, on either side.
    pub fn products(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.inputs.keys().chain(self.outputs.keys()).copied()
    }

    pub(crate) fn input_mut(&mut self, product: ProductId) -> Option<&mut InputPort> {
        self.inputs.get_mut(&product)
    }

    pub(crate) fn output_mut(&mut self, product: ProductId) -> Option<&mut OutputPort> {
        self.outputs.get_mut(&product)
    }
}
