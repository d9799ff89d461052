//! Catalog loading.
//!
//! `products`, `machines` and `recipes` each live in one file under the data
//! directory; the extension picks RON, TOML or JSON. [`load_catalog`] reads
//! the three files, turns keys into ids and hands everything to a
//! [`CatalogBuilder`].

use crate::schema::{EntryData, MachineData, ProductData, RecipeData};
use flowplan_core::catalog::{Catalog, CatalogBuilder, CatalogError, Maintenance, RecipeEntry};
use flowplan_core::id::{MachineId, ProductId, RecipeId};
use flowplan_core::quantity::Quantity;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("no {base}.ron, {base}.toml or {base}.json in {dir}")]
    MissingFile { base: String, dir: PathBuf },

    #[error("{path}: not a .ron, .toml or .json file")]
    UnknownExtension { path: PathBuf },

    /// Two formats present for one base name.
    #[error("{first} and {second} describe the same data")]
    AmbiguousFile { first: PathBuf, second: PathBuf },

    #[error("{path}: {message}")]
    Syntax { path: PathBuf, message: String },

    #[error("{path}: {kind} '{key}' is not defined")]
    UnknownKey {
        path: PathBuf,
        kind: &'static str,
        key: String,
    },

    #[error("{path}: {kind} '{key}' is defined twice")]
    DuplicateKey {
        path: PathBuf,
        kind: &'static str,
        key: String,
    },

    /// Negative, not finite, or outside the `Quantity` range.
    #[error("{path}: {what} has invalid quantity {value}")]
    InvalidQuantity {
        path: PathBuf,
        what: String,
        value: f64,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("reading data file: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Formats and files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// Lookup order when scanning a directory.
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }

    pub fn of(path: &Path) -> Result<Self, DataLoadError> {
        let ext = path.extension().and_then(|e| e.to_str());
        Self::ALL
            .into_iter()
            .find(|f| Some(f.extension()) == ext)
            .ok_or_else(|| DataLoadError::UnknownExtension {
                path: path.to_path_buf(),
            })
    }

    fn parse<T: DeserializeOwned>(self, text: &str) -> Result<T, String> {
        match self {
            Format::Ron => ron::from_str(text).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str(text).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

/// The `base` data file in `dir`, if there is exactly one.
pub fn locate(dir: &Path, base: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut present = Format::ALL
        .iter()
        .map(|f| dir.join(format!("{base}.{}", f.extension())))
        .filter(|p| p.is_file());
    let Some(first) = present.next() else {
        return Ok(None);
    };
    match present.next() {
        Some(second) => Err(DataLoadError::AmbiguousFile { first, second }),
        None => Ok(Some(first)),
    }
}

pub fn locate_required(dir: &Path, base: &str) -> Result<PathBuf, DataLoadError> {
    locate(dir, base)?.ok_or_else(|| DataLoadError::MissingFile {
        base: base.to_string(),
        dir: dir.to_path_buf(),
    })
}

fn syntax(path: &Path, message: impl ToString) -> DataLoadError {
    DataLoadError::Syntax {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Read and parse a whole data file.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = Format::of(path)?;
    let text = fs::read_to_string(path)?;
    format.parse(&text).map_err(|m| syntax(path, m))
}

/// Read a list of records. A TOML document cannot be a bare array, so TOML
/// files keep the list under `table_key` (`[[products]]` and so on).
pub fn read_records<T: DeserializeOwned>(
    path: &Path,
    table_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if Format::of(path)? != Format::Toml {
        return deserialize_file(path);
    }
    let mut table: toml::Table = deserialize_file(path)?;
    let list = table
        .remove(table_key)
        .ok_or_else(|| syntax(path, format!("expected a [[{table_key}]] array")))?;
    list.try_into().map_err(|e: toml::de::Error| syntax(path, e))
}

/// Convert an amount read from data. Zero is allowed.
pub fn to_quantity(value: f64, path: &Path, what: &str) -> Result<Quantity, DataLoadError> {
    let invalid = || DataLoadError::InvalidQuantity {
        path: path.to_path_buf(),
        what: what.to_string(),
        value,
    };
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Quantity::checked_from_num(value).ok_or_else(invalid)
}

// ---------------------------------------------------------------------------
// Key resolution
// ---------------------------------------------------------------------------

/// Keys defined by one data file and the ids the builder gave them.
struct KeyIndex<'a, I> {
    kind: &'static str,
    path: &'a Path,
    ids: HashMap<String, I>,
}

impl<'a, I: Copy> KeyIndex<'a, I> {
    fn new(kind: &'static str, path: &'a Path) -> Self {
        Self {
            kind,
            path,
            ids: HashMap::new(),
        }
    }

    fn ensure_new(&self, key: &str) -> Result<(), DataLoadError> {
        if self.ids.contains_key(key) {
            return Err(DataLoadError::DuplicateKey {
                path: self.path.to_path_buf(),
                kind: self.kind,
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, key: &str, id: I) {
        self.ids.insert(key.to_string(), id);
    }

    /// Look up a key referenced from `from`.
    fn resolve(&self, key: &str, from: &Path) -> Result<I, DataLoadError> {
        self.ids
            .get(key)
            .copied()
            .ok_or_else(|| DataLoadError::UnknownKey {
                path: from.to_path_buf(),
                kind: self.kind,
                key: key.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Load `products`, `machines` and `recipes` data files from `dir` and
/// build the catalog.
pub fn load_catalog(dir: &Path) -> Result<Catalog, DataLoadError> {
    let products_file = locate_required(dir, "products")?;
    let machines_file = locate_required(dir, "machines")?;
    let recipes_file = locate_required(dir, "recipes")?;

    let products: Vec<ProductData> = read_records(&products_file, "products")?;
    debug!(file = %products_file.display(), count = products.len(), "read products");
    let machines: Vec<MachineData> = read_records(&machines_file, "machines")?;
    debug!(file = %machines_file.display(), count = machines.len(), "read machines");
    let recipes: Vec<RecipeData> = read_records(&recipes_file, "recipes")?;
    debug!(file = %recipes_file.display(), count = recipes.len(), "read recipes");

    let mut builder = CatalogBuilder::new();
    let product_ids = register_products(&mut builder, &products, &products_file)?;
    let machine_ids = register_machines(&mut builder, &machines, &product_ids, &machines_file)?;
    register_recipes(
        &mut builder,
        &recipes,
        &product_ids,
        &machine_ids,
        &recipes_file,
    )?;

    let catalog = builder.build()?;
    info!(
        dir = %dir.display(),
        products = catalog.product_count(),
        machines = catalog.machine_count(),
        recipes = catalog.recipe_count(),
        "catalog loaded"
    );
    Ok(catalog)
}

fn register_products<'a>(
    builder: &mut CatalogBuilder,
    products: &[ProductData],
    file: &'a Path,
) -> Result<KeyIndex<'a, ProductId>, DataLoadError> {
    let mut ids = KeyIndex::new("product", file);
    for product in products {
        ids.ensure_new(&product.key)?;
        ids.insert(&product.key, builder.register_product(&product.key, &product.name));
        if let Some(icon) = &product.icon {
            builder.mutate_product(&product.key, |p| p.icon = Some(icon.clone()))?;
        }
    }
    Ok(ids)
}

fn resolve_entries(
    entries: &[EntryData],
    product_ids: &KeyIndex<'_, ProductId>,
    file: &Path,
    what: &str,
) -> Result<Vec<RecipeEntry>, DataLoadError> {
    entries
        .iter()
        .map(|entry| {
            let product = product_ids.resolve(entry.product(), file)?;
            let quantity = to_quantity(entry.quantity(), file, what)?;
            Ok(RecipeEntry::new(product, quantity))
        })
        .collect()
}

fn register_machines<'a>(
    builder: &mut CatalogBuilder,
    machines: &[MachineData],
    product_ids: &KeyIndex<'_, ProductId>,
    file: &'a Path,
) -> Result<KeyIndex<'a, MachineId>, DataLoadError> {
    let mut ids = KeyIndex::new("machine", file);
    for data in machines {
        ids.ensure_new(&data.key)?;
        let what = format!("machine '{}'", data.key);

        let build_costs = resolve_entries(&data.build_costs, product_ids, file, &what)?;
        let maintenance = data
            .maintenance
            .as_ref()
            .map(|m| -> Result<Maintenance, DataLoadError> {
                Ok(Maintenance {
                    kind: m.kind,
                    quantity: to_quantity(m.quantity, file, &what)?,
                })
            })
            .transpose()?;
        let electricity = to_quantity(data.electricity, file, &what)?;
        let unity = to_quantity(data.unity, file, &what)?;
        let computing = to_quantity(data.computing, file, &what)?;

        ids.insert(&data.key, builder.register_machine(&data.key, &data.name));
        builder.mutate_machine(&data.key, |m| {
            m.icon = data.icon.clone();
            m.is_storage = data.is_storage;
            m.is_mine = data.is_mine;
            m.build_costs = build_costs;
            m.workers = data.workers;
            m.maintenance = maintenance;
            m.electricity = electricity;
            m.unity = unity;
            m.computing = computing;
        })?;
    }
    Ok(ids)
}

fn register_recipes(
    builder: &mut CatalogBuilder,
    recipes: &[RecipeData],
    product_ids: &KeyIndex<'_, ProductId>,
    machine_ids: &KeyIndex<'_, MachineId>,
    file: &Path,
) -> Result<(), DataLoadError> {
    let mut ids: KeyIndex<'_, RecipeId> = KeyIndex::new("recipe", file);
    for data in recipes {
        ids.ensure_new(&data.key)?;
        let what = format!("recipe '{}'", data.key);

        let machine = machine_ids.resolve(&data.machine, file)?;
        let inputs = resolve_entries(&data.inputs, product_ids, file, &what)?;
        let outputs = resolve_entries(&data.outputs, product_ids, file, &what)?;
        if inputs.is_empty() && outputs.is_empty() {
            warn!(recipe = %data.key, "recipe has no inputs and no outputs");
        }

        ids.insert(&data.key, builder.register_recipe(&data.key, machine, inputs, outputs));
        if let Some(name) = &data.name {
            builder.mutate_recipe(&data.key, |r| r.name = name.clone())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowplan_core::catalog::MaintenanceKind;
    use flowplan_core::quantity::qty;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "flowplan_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Clean up a test directory.
    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    fn write_minimal_ron(dir: &Path) {
        fs::write(
            dir.join("products.ron"),
            r#"[(key: "ore", name: "Ore"), (key: "plate", name: "Plate", icon: Some("plate.png"))]"#,
        )
        .unwrap();
        fs::write(
            dir.join("machines.ron"),
            r#"[
                (key: "mine", name: "Mine", is_mine: true),
                (
                    key: "smelter",
                    name: "Smelter",
                    build_costs: [("plate", 10.0)],
                    workers: 5,
                    maintenance: Some((kind: maintenance_i, quantity: 1.5)),
                    electricity: 0.5,
                ),
            ]"#,
        )
        .unwrap();
        fs::write(
            dir.join("recipes.ron"),
            r#"[
                (key: "dig", machine: "mine", outputs: [("ore", 0.0)]),
                (
                    key: "smelt",
                    name: Some("Smelt plates"),
                    machine: "smelter",
                    inputs: [("ore", 2.0)],
                    outputs: [(product: "plate", quantity: 1.0)],
                ),
            ]"#,
        )
        .unwrap();
    }

    // -----------------------------------------------------------------------
    // Format / locate
    // -----------------------------------------------------------------------

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::of(Path::new("products.ron")).unwrap(), Format::Ron);
        assert_eq!(Format::of(Path::new("products.toml")).unwrap(), Format::Toml);
        assert_eq!(Format::of(Path::new("products.json")).unwrap(), Format::Json);
    }

    #[test]
    fn format_unknown_extension() {
        for name in ["products.yaml", "products"] {
            assert!(matches!(
                Format::of(Path::new(name)),
                Err(DataLoadError::UnknownExtension { .. })
            ));
        }
    }

    #[test]
    fn locate_found_and_missing() {
        let dir = make_test_dir("find");
        assert_eq!(locate(&dir, "products").unwrap(), None);

        fs::write(dir.join("products.json"), "[]").unwrap();
        assert_eq!(
            locate(&dir, "products").unwrap(),
            Some(dir.join("products.json"))
        );

        cleanup(&dir);
    }

    #[test]
    fn locate_two_formats_is_ambiguous() {
        let dir = make_test_dir("find_conflict");
        fs::write(dir.join("products.ron"), "[]").unwrap();
        fs::write(dir.join("products.json"), "[]").unwrap();

        let result = locate(&dir, "products");
        assert!(matches!(
            result,
            Err(DataLoadError::AmbiguousFile { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn locate_required_missing() {
        let dir = make_test_dir("require_missing");

        let err = locate_required(&dir, "recipes").unwrap_err();
        assert!(matches!(err, DataLoadError::MissingFile { ref base, .. } if base == "recipes"));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // read_records
    // -----------------------------------------------------------------------

    #[test]
    fn read_records_toml() {
        let dir = make_test_dir("list_toml");
        let path = dir.join("products.toml");
        fs::write(
            &path,
            r#"
[[products]]
key = "iron_ore"
name = "Iron Ore"

[[products]]
key = "coal"
name = "Coal"
"#,
        )
        .unwrap();

        let products: Vec<ProductData> = read_records(&path, "products").unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[1].key, "coal");

        cleanup(&dir);
    }

    #[test]
    fn read_records_toml_missing_table() {
        let dir = make_test_dir("list_toml_missing");
        let path = dir.join("products.toml");
        fs::write(&path, r#"foo = "bar""#).unwrap();

        let result: Result<Vec<ProductData>, _> = read_records(&path, "products");
        assert!(matches!(result, Err(DataLoadError::Syntax { .. })));

        cleanup(&dir);
    }

    #[test]
    fn deserialize_file_parse_error() {
        let dir = make_test_dir("deser_parse_err");
        let path = dir.join("bad.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();

        let result: Result<Vec<ProductData>, _> = deserialize_file(&path);
        assert!(matches!(result, Err(DataLoadError::Syntax { .. })));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // KeyIndex / to_quantity
    // -----------------------------------------------------------------------

    #[test]
    fn key_index_rejects_unknown_and_repeated_keys() {
        let file = Path::new("products.ron");
        let mut ids = KeyIndex::new("product", file);
        ids.ensure_new("iron_ore").unwrap();
        ids.insert("iron_ore", 42u32);

        assert_eq!(ids.resolve("iron_ore", Path::new("recipes.ron")).unwrap(), 42);
        assert!(matches!(
            ids.ensure_new("iron_ore"),
            Err(DataLoadError::DuplicateKey { ref key, kind: "product", ref path })
                if key == "iron_ore" && path == file
        ));
        assert!(matches!(
            ids.resolve("coal", Path::new("recipes.ron")),
            Err(DataLoadError::UnknownKey { ref key, ref path, .. })
                if key == "coal" && path.ends_with("recipes.ron")
        ));
    }

    #[test]
    fn to_quantity_rejects_bad_values() {
        let file = Path::new("recipes.ron");
        assert_eq!(to_quantity(2.5, file, "x").unwrap(), qty(2.5));
        assert_eq!(to_quantity(0.0, file, "x").unwrap(), Quantity::ZERO);
        for bad in [-1.0, f64::NAN, f64::INFINITY, 1e12] {
            assert!(matches!(
                to_quantity(bad, file, "x"),
                Err(DataLoadError::InvalidQuantity { .. })
            ));
        }
    }

    // -----------------------------------------------------------------------
    // load_catalog
    // -----------------------------------------------------------------------

    #[test]
    fn load_catalog_resolves_everything() {
        let dir = make_test_dir("load_ok");
        write_minimal_ron(&dir);

        let catalog = load_catalog(&dir).unwrap();
        assert_eq!(catalog.product_count(), 2);
        assert_eq!(catalog.recipe_count(), 2);

        let plate = catalog.product_id("plate").unwrap();
        assert_eq!(
            catalog.get_product(plate).unwrap().icon.as_deref(),
            Some("plate.png")
        );

        let smelter = catalog
            .get_machine(catalog.machine_id("smelter").unwrap())
            .unwrap();
        assert_eq!(smelter.workers, 5);
        assert_eq!(smelter.build_costs, vec![RecipeEntry::new(plate, qty(10.0))]);
        assert_eq!(
            smelter.maintenance.map(|m| m.kind),
            Some(MaintenanceKind::Tier1)
        );
        assert!(
            catalog
                .get_machine(catalog.machine_id("mine").unwrap())
                .unwrap()
                .is_mine
        );

        let smelt = catalog.get_recipe(catalog.recipe_id("smelt").unwrap()).unwrap();
        assert_eq!(smelt.name, "Smelt plates");
        assert_eq!(smelt.inputs[0].quantity, qty(2.0));
        let dig = catalog.get_recipe(catalog.recipe_id("dig").unwrap()).unwrap();
        assert_eq!(dig.name, "dig");

        cleanup(&dir);
    }

    #[test]
    fn load_catalog_unresolved_product() {
        let dir = make_test_dir("load_unresolved");
        write_minimal_ron(&dir);
        fs::write(
            dir.join("recipes.ron"),
            r#"[(key: "dig", machine: "mine", outputs: [("gold", 0.0)])]"#,
        )
        .unwrap();

        let err = load_catalog(&dir).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::UnknownKey { ref key, kind: "product", ref path }
                if key == "gold" && path.ends_with("recipes.ron")
        ));

        cleanup(&dir);
    }

    #[test]
    fn load_catalog_duplicate_machine() {
        let dir = make_test_dir("load_dup");
        write_minimal_ron(&dir);
        fs::write(
            dir.join("machines.ron"),
            r#"[(key: "mine", name: "Mine"), (key: "mine", name: "Other")]"#,
        )
        .unwrap();

        let err = load_catalog(&dir).unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateKey { ref key, kind: "machine", .. } if key == "mine"));

        cleanup(&dir);
    }

    #[test]
    fn load_catalog_rejects_overflowing_duplicate_entries() {
        let dir = make_test_dir("load_overflow");
        write_minimal_ron(&dir);
        fs::write(
            dir.join("recipes.ron"),
            r#"[(key: "smelt", machine: "smelter", inputs: [("ore", 2000000000.0), ("ore", 2000000000.0)], outputs: [("plate", 1.0)])]"#,
        )
        .unwrap();

        let err = load_catalog(&dir).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::Catalog(CatalogError::QuantityOverflow { ref recipe, .. }) if recipe == "smelt"
        ));

        cleanup(&dir);
    }

    #[test]
    fn load_catalog_missing_file() {
        let dir = make_test_dir("load_missing");
        fs::write(dir.join("products.ron"), "[]").unwrap();

        let err = load_catalog(&dir).unwrap_err();
        assert!(err.to_string().contains("machines"));

        cleanup(&dir);
    }
}
