use crate::id::*;
use crate::quantity::Quantity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A product definition in the catalog.
#[derive(Debug, Clone)]
pub struct ProductDef {
    /// Stable string key used by data files.
    pub key: String,
    pub name: String,
    pub icon: Option<String>,
}

/// A product and amount, used for recipe inputs/outputs and build costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeEntry {
    pub product: ProductId,
    pub quantity: Quantity,
}

impl RecipeEntry {
    pub fn new(product: ProductId, quantity: Quantity) -> Self {
        Self { product, quantity }
    }
}

/// Maintenance tier a machine draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MaintenanceKind {
    #[serde(rename = "maintenance_i")]
    Tier1,
    #[serde(rename = "maintenance_ii")]
    Tier2,
}

/// Per-machine maintenance upkeep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Maintenance {
    pub kind: MaintenanceKind,
    pub quantity: Quantity,
}

/// A machine definition. `is_storage` and `is_mine` change how a node's
/// ports report satisfaction.
#[derive(Debug, Clone)]
pub struct MachineDef {
    pub key: String,
    pub name: String,
    pub icon: Option<String>,
    pub is_storage: bool,
    pub is_mine: bool,
    pub build_costs: Vec<RecipeEntry>,
    pub workers: u32,
    pub maintenance: Option<Maintenance>,
    pub electricity: Quantity,
    pub unity: Quantity,
    pub computing: Quantity,
}

impl MachineDef {
    fn named(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            icon: None,
            is_storage: false,
            is_mine: false,
            build_costs: Vec::new(),
            workers: 0,
            maintenance: None,
            electricity: Quantity::ZERO,
            unity: Quantity::ZERO,
            computing: Quantity::ZERO,
        }
    }
}

/// A recipe definition: one machine, ordered inputs and outputs per cycle.
#[derive(Debug, Clone)]
pub struct RecipeDef {
    pub key: String,
    pub name: String,
    pub machine: MachineId,
    pub inputs: Vec<RecipeEntry>,
    pub outputs: Vec<RecipeEntry>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate {kind} key: {key}")]
    DuplicateKey { kind: &'static str, key: String },
    #[error("invalid product reference: {0:?}")]
    InvalidProductRef(ProductId),
    #[error("invalid machine reference: {0:?}")]
    InvalidMachineRef(MachineId),
    #[error("recipe {recipe}: summed quantity of {product:?} overflows")]
    QuantityOverflow { recipe: String, product: ProductId },
}

/// Builder for constructing an immutable [`Catalog`].
/// Three-phase lifecycle: registration -> mutation -> finalization.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    products: Vec<ProductDef>,
    product_keys: HashMap<String, ProductId>,
    machines: Vec<MachineDef>,
    machine_keys: HashMap<String, MachineId>,
    recipes: Vec<RecipeDef>,
    recipe_keys: HashMap<String, RecipeId>,
    duplicates: Vec<(&'static str, String)>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase 1: Register a product. Returns its ID.
    pub fn register_product(&mut self, key: &str, name: &str) -> ProductId {
        let id = ProductId(self.products.len() as u32);
        self.products.push(ProductDef {
            key: key.to_string(),
            name: name.to_string(),
            icon: None,
        });
        if self.product_keys.insert(key.to_string(), id).is_some() {
            self.duplicates.push(("product", key.to_string()));
        }
        id
    }

    /// Phase 1: Register a machine with no costs and no special role.
    pub fn register_machine(&mut self, key: &str, name: &str) -> MachineId {
        let id = MachineId(self.machines.len() as u32);
        self.machines.push(MachineDef::named(key, name));
        if self.machine_keys.insert(key.to_string(), id).is_some() {
            self.duplicates.push(("machine", key.to_string()));
        }
        id
    }

    /// Phase 1: Register a recipe run by `machine`. The display name starts
    /// out equal to the key.
    pub fn register_recipe(
        &mut self,
        key: &str,
        machine: MachineId,
        inputs: Vec<RecipeEntry>,
        outputs: Vec<RecipeEntry>,
    ) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipes.push(RecipeDef {
            key: key.to_string(),
            name: key.to_string(),
            machine,
            inputs,
            outputs,
        });
        if self.recipe_keys.insert(key.to_string(), id).is_some() {
            self.duplicates.push(("recipe", key.to_string()));
        }
        id
    }

    /// Phase 2: Mutate an existing product by key.
    pub fn mutate_product<F>(&mut self, key: &str, f: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&mut ProductDef),
    {
        let id = self
            .product_keys
            .get(key)
            .ok_or(CatalogError::NotFound(key.to_string()))?;
        f(&mut self.products[id.0 as usize]);
        Ok(())
    }

    /// Phase 2: Mutate an existing machine by key.
    pub fn mutate_machine<F>(&mut self, key: &str, f: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&mut MachineDef),
    {
        let id = self
            .machine_keys
            .get(key)
            .ok_or(CatalogError::NotFound(key.to_string()))?;
        f(&mut self.machines[id.0 as usize]);
        Ok(())
    }

    /// Phase 2: Mutate an existing recipe by key.
    pub fn mutate_recipe<F>(&mut self, key: &str, f: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&mut RecipeDef),
    {
        let id = self
            .recipe_keys
            .get(key)
            .ok_or(CatalogError::NotFound(key.to_string()))?;
        f(&mut self.recipes[id.0 as usize]);
        Ok(())
    }

    pub fn product_id(&self, key: &str) -> Option<ProductId> {
        self.product_keys.get(key).copied()
    }

    pub fn machine_id(&self, key: &str) -> Option<MachineId> {
        self.machine_keys.get(key).copied()
    }

    pub fn recipe_id(&self, key: &str) -> Option<RecipeId> {
        self.recipe_keys.get(key).copied()
    }

    /// Phase 3: Finalize and build the immutable catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        if let Some((kind, key)) = self.duplicates.into_iter().next() {
            return Err(CatalogError::DuplicateKey { kind, key });
        }

        let product_count = self.products.len();
        let check_product = |entry: &RecipeEntry| {
            if entry.product.0 as usize >= product_count {
                Err(CatalogError::InvalidProductRef(entry.product))
            } else {
                Ok(())
            }
        };

        for machine in &self.machines {
            machine.build_costs.iter().try_for_each(check_product)?;
        }
        for recipe in &self.recipes {
            if recipe.machine.0 as usize >= self.machines.len() {
                return Err(CatalogError::InvalidMachineRef(recipe.machine));
            }
            recipe
                .inputs
                .iter()
                .chain(recipe.outputs.iter())
                .try_for_each(check_product)?;
            for side in [&recipe.inputs, &recipe.outputs] {
                check_merged_quantities(&recipe.key, side)?;
            }
        }

        Ok(Catalog {
            products: self.products,
            product_keys: self.product_keys,
            machines: self.machines,
            machine_keys: self.machine_keys,
            recipes: self.recipes,
            recipe_keys: self.recipe_keys,
        })
    }
}

/// Entries naming the same product are merged into one port, so their sum
/// has to fit a `Quantity`.
fn check_merged_quantities(recipe: &str, entries: &[RecipeEntry]) -> Result<(), CatalogError> {
    let mut totals: HashMap<ProductId, Quantity> = HashMap::new();
    for entry in entries {
        let total = totals.entry(entry.product).or_insert(Quantity::ZERO);
        *total = total
            .checked_add(entry.quantity)
            .ok_or_else(|| CatalogError::QuantityOverflow {
                recipe: recipe.to_string(),
                product: entry.product,
            })?;
    }
    Ok(())
}

/// Immutable catalog of products, machines and recipes. Frozen after
/// `build()`; share it behind an `Arc`.
#[derive(Debug)]
pub struct Catalog {
    products: Vec<ProductDef>,
    product_keys: HashMap<String, ProductId>,
    machines: Vec<MachineDef>,
    machine_keys: HashMap<String, MachineId>,
    recipes: Vec<RecipeDef>,
    recipe_keys: HashMap<String, RecipeId>,
}

impl Catalog {
    pub fn get_product(&self, id: ProductId) -> Option<&ProductDef> {
        self.products.get(id.0 as usize)
    }

    pub fn get_machine(&self, id: MachineId) -> Option<&MachineDef> {
        self.machines.get(id.0 as usize)
    }

    pub fn get_recipe(&self, id: RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id.0 as usize)
    }

    pub fn product_id(&self, key: &str) -> Option<ProductId> {
        self.product_keys.get(key).copied()
    }

    pub fn machine_id(&self, key: &str) -> Option<MachineId> {
        self.machine_keys.get(key).copied()
    }

    pub fn recipe_id(&self, key: &str) -> Option<RecipeId> {
        self.recipe_keys.get(key).copied()
    }

    /// Display name of a product, falling back to its debug id.
    pub fn product_name(&self, id: ProductId) -> String {
        self.get_product(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("{id:?}"))
    }

    /// All recipes in registration order.
    pub fn recipes(&self) -> impl Iterator<Item = (RecipeId, &RecipeDef)> {
        self.recipes
            .iter()
            .enumerate()
            .map(|(i, r)| (RecipeId(i as u32), r))
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::qty;

    fn setup_builder() -> CatalogBuilder {
        let mut b = CatalogBuilder::new();
        let iron_ore = b.register_product("iron_ore", "Iron Ore");
        let iron_plate = b.register_product("iron_plate", "Iron Plate");
        let smelter = b.register_machine("smelter", "Smelter");
        b.register_recipe(
            "smelt_iron",
            smelter,
            vec![RecipeEntry::new(iron_ore, qty(2.0))],
            vec![RecipeEntry::new(iron_plate, qty(1.0))],
        );
        b
    }

    #[test]
    fn register_and_build() {
        let cat = setup_builder().build().unwrap();
        assert_eq!(cat.product_count(), 2);
        assert_eq!(cat.machine_count(), 1);
        assert_eq!(cat.recipe_count(), 1);
    }

    #[test]
    fn lookup_by_key() {
        let cat = setup_builder().build().unwrap();
        assert!(cat.product_id("iron_ore").is_some());
        assert!(cat.product_id("nonexistent").is_none());
        let recipe = cat.get_recipe(cat.recipe_id("smelt_iron").unwrap()).unwrap();
        assert_eq!(recipe.name, "smelt_iron");
        assert_eq!(recipe.inputs[0].quantity, qty(2.0));
    }

    #[test]
    fn mutate_machine_flags() {
        let mut builder = setup_builder();
        builder
            .mutate_machine("smelter", |m| {
                m.is_storage = true;
                m.workers = 4;
            })
            .unwrap();
        let cat = builder.build().unwrap();
        let smelter = cat.get_machine(cat.machine_id("smelter").unwrap()).unwrap();
        assert!(smelter.is_storage);
        assert!(!smelter.is_mine);
        assert_eq!(smelter.workers, 4);
    }

    #[test]
    fn mutate_nonexistent_fails() {
        let mut builder = setup_builder();
        match builder.mutate_recipe("nonexistent", |_| {}) {
            Err(CatalogError::NotFound(key)) => assert_eq!(key, "nonexistent"),
            other => panic!("expected NotFound, got: {other:?}"),
        }
        assert!(builder.mutate_product("nope", |_| {}).is_err());
    }

    #[test]
    fn invalid_product_ref_in_recipe_fails() {
        let mut b = CatalogBuilder::new();
        let m = b.register_machine("m", "M");
        b.register_recipe("bad", m, vec![RecipeEntry::new(ProductId(999), qty(1.0))], vec![]);
        match b.build() {
            Err(CatalogError::InvalidProductRef(id)) => assert_eq!(id, ProductId(999)),
            other => panic!("expected InvalidProductRef, got: {other:?}"),
        }
    }

    #[test]
    fn invalid_build_cost_ref_fails() {
        let mut b = CatalogBuilder::new();
        b.register_machine("m", "M");
        b.mutate_machine("m", |m| {
            m.build_costs.push(RecipeEntry::new(ProductId(7), qty(10.0)))
        })
        .unwrap();
        assert!(matches!(
            b.build(),
            Err(CatalogError::InvalidProductRef(ProductId(7)))
        ));
    }

    #[test]
    fn invalid_machine_ref_fails() {
        let mut b = CatalogBuilder::new();
        b.register_recipe("orphan", MachineId(3), vec![], vec![]);
        assert!(matches!(
            b.build(),
            Err(CatalogError::InvalidMachineRef(MachineId(3)))
        ));
    }

    #[test]
    fn duplicate_entries_overflowing_on_merge_fail() {
        let mut b = setup_builder();
        let ore = b.product_id("iron_ore").unwrap();
        let plate = b.product_id("iron_plate").unwrap();
        let smelter = b.machine_id("smelter").unwrap();
        b.register_recipe(
            "huge",
            smelter,
            vec![RecipeEntry::new(ore, qty(2e9)), RecipeEntry::new(ore, qty(2e9))],
            vec![RecipeEntry::new(plate, qty(1.0))],
        );
        let result = b.build();
        assert!(matches!(
            result,
            Err(CatalogError::QuantityOverflow { ref recipe, product }) if recipe == "huge" && product == ore
        ));
    }

    #[test]
    fn duplicate_key_fails() {
        let mut b = setup_builder();
        b.register_product("iron_ore", "Iron Ore again");
        let err = b.build().unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DuplicateKey { kind: "product", ref key } if key == "iron_ore"
        ));
        assert!(err.to_string().contains("duplicate product key"));
    }

    #[test]
    fn product_name_falls_back_to_id() {
        let cat = setup_builder().build().unwrap();
        assert_eq!(cat.product_name(ProductId(1)), "Iron Plate");
        assert_eq!(cat.product_name(ProductId(42)), "ProductId(42)");
    }

    #[test]
    fn recipes_iterate_in_registration_order() {
        let mut b = setup_builder();
        let m = b.machine_id("smelter").unwrap();
        b.register_recipe("second", m, vec![], vec![]);
        let cat = b.build().unwrap();
        let keys: Vec<&str> = cat.recipes().map(|(_, r)| r.key.as_str()).collect();
        assert_eq!(keys, ["smelt_iron", "second"]);
    }

    #[test]
    fn catalog_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Catalog>();
    }
}
