//! Serde data file structs for catalog content and plan scripts.
//!
//! These structs define the on-disk format for products, machines, recipes
//! and plan scripts. They are deserialized from RON, JSON, or TOML data
//! files and then resolved into core types by the loader.

use flowplan_core::catalog::MaintenanceKind;
use serde::Deserialize;

// ===========================================================================
// Catalog: Products
// ===========================================================================

/// A product definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductData {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

// ===========================================================================
// Catalog: Amounts
// ===========================================================================

/// A product amount, in short tuple form or full form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntryData {
    /// Short form: `("product_key", quantity)`.
    Short(String, f64),
    Full { product: String, quantity: f64 },
}

impl EntryData {
    pub fn product(&self) -> &str {
        match self {
            EntryData::Short(product, _) | EntryData::Full { product, .. } => product,
        }
    }

    pub fn quantity(&self) -> f64 {
        match self {
            EntryData::Short(_, quantity) | EntryData::Full { quantity, .. } => *quantity,
        }
    }
}

// ===========================================================================
// Catalog: Machines
// ===========================================================================

/// Maintenance upkeep of a machine.
#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceData {
    pub kind: MaintenanceKind,
    pub quantity: f64,
}

/// A machine definition in a data file. Every cost field is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineData {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_storage: bool,
    #[serde(default)]
    pub is_mine: bool,
    #[serde(default)]
    pub build_costs: Vec<EntryData>,
    #[serde(default)]
    pub workers: u32,
    #[serde(default)]
    pub maintenance: Option<MaintenanceData>,
    #[serde(default)]
    pub electricity: f64,
    #[serde(default)]
    pub unity: f64,
    #[serde(default)]
    pub computing: f64,
}

// ===========================================================================
// Catalog: Recipes
// ===========================================================================

/// A recipe definition in a data file. `name` defaults to `key`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    pub machine: String,
    #[serde(default)]
    pub inputs: Vec<EntryData>,
    #[serde(default)]
    pub outputs: Vec<EntryData>,
}

// ===========================================================================
// Plan scripts
// ===========================================================================

/// A list of plan edits, applied in order. Nodes are named by alias; links
/// are named by their `(from, to, product)` triple.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanScript {
    /// Stop at the first rejected step instead of skipping it.
    #[serde(default)]
    pub strict: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub enum Step {
    AddNode {
        alias: String,
        recipe: String,
    },
    RemoveNode {
        alias: String,
    },
    Link {
        from: String,
        to: String,
        product: String,
        quantity: f64,
    },
    Unlink {
        from: String,
        to: String,
        product: String,
    },
    Requantify {
        from: String,
        to: String,
        product: String,
        quantity: f64,
    },
}

impl Step {
    /// Short verb for log lines.
    pub fn verb(&self) -> &'static str {
        match self {
            Step::AddNode { .. } => "add_node",
            Step::RemoveNode { .. } => "remove_node",
            Step::Link { .. } => "link",
            Step::Unlink { .. } => "unlink",
            Step::Requantify { .. } => "requantify",
        }
    }
}
