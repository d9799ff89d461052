pub mod loader;
pub mod schema;
pub mod script;

pub use loader::{load_catalog, DataLoadError};
pub use schema::{PlanScript, Step};
pub use script::{load_script, run_script, ScriptError, ScriptOutcome};
