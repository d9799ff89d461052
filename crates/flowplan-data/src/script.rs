//! Plan script runner.
//!
//! Applies the steps of a [`PlanScript`] to a [`FlowGraph`] through the
//! public core API. Node aliases are bound by `AddNode` steps and released
//! by `RemoveNode`.

use crate::loader::{deserialize_file, to_quantity, DataLoadError};
use crate::schema::{PlanScript, Step};
use flowplan_core::graph::{FlowGraph, GraphError};
use flowplan_core::id::{EdgeId, NodeId, ProductId};
use std::path::Path;
use tracing::{debug, info, warn};

/// Reasons a step can be rejected. `step` is the 1-based step number.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("step {step}: unknown alias '{alias}'")]
    UnknownAlias { step: usize, alias: String },
    #[error("step {step}: alias '{alias}' is already bound")]
    DuplicateAlias { step: usize, alias: String },
    #[error("step {step}: unknown recipe '{key}'")]
    UnknownRecipe { step: usize, key: String },
    #[error("step {step}: unknown product '{key}'")]
    UnknownProduct { step: usize, key: String },
    #[error("step {step}: no {product} link from '{from}' to '{to}'")]
    NoSuchLink {
        step: usize,
        from: String,
        to: String,
        product: String,
    },
    #[error("step {step}: {source}")]
    Quantity {
        step: usize,
        #[source]
        source: DataLoadError,
    },
    #[error("step {step}: {source}")]
    Graph {
        step: usize,
        #[source]
        source: GraphError,
    },
}

impl ScriptError {
    pub fn step(&self) -> usize {
        match self {
            ScriptError::UnknownAlias { step, .. }
            | ScriptError::DuplicateAlias { step, .. }
            | ScriptError::UnknownRecipe { step, .. }
            | ScriptError::UnknownProduct { step, .. }
            | ScriptError::NoSuchLink { step, .. }
            | ScriptError::Quantity { step, .. }
            | ScriptError::Graph { step, .. } => *step,
        }
    }
}

/// What a run did.
#[derive(Debug, Default)]
pub struct ScriptOutcome {
    /// Live aliases in binding order.
    pub aliases: Vec<(String, NodeId)>,
    pub applied: usize,
    /// Steps skipped in lenient mode.
    pub rejected: Vec<ScriptError>,
}

impl ScriptOutcome {
    pub fn node(&self, alias: &str) -> Option<NodeId> {
        self.aliases
            .iter()
            .find(|(name, _)| name == alias)
            .map(|&(_, id)| id)
    }

    pub fn alias_of(&self, node: NodeId) -> Option<&str> {
        self.aliases
            .iter()
            .find(|&&(_, id)| id == node)
            .map(|(name, _)| name.as_str())
    }
}

/// Read a plan script file (RON, TOML or JSON).
pub fn load_script(path: &Path) -> Result<PlanScript, DataLoadError> {
    let script: PlanScript = deserialize_file(path)?;
    debug!(file = %path.display(), steps = script.steps.len(), "read plan script");
    Ok(script)
}

/// Apply every step in order. In strict mode the first rejection is
/// returned as the error and later steps are not run; otherwise rejected
/// steps are logged, collected and skipped.
pub fn run_script(graph: &mut FlowGraph, script: &PlanScript) -> Result<ScriptOutcome, ScriptError> {
    let mut outcome = ScriptOutcome::default();

    for (index, step) in script.steps.iter().enumerate() {
        let number = index + 1;
        match apply_step(graph, &mut outcome, number, step) {
            Ok(()) => {
                outcome.applied += 1;
                debug!(step = number, verb = step.verb(), "applied");
            }
            Err(e) if script.strict => return Err(e),
            Err(e) => {
                warn!(step = number, verb = step.verb(), error = %e, "step rejected");
                outcome.rejected.push(e);
            }
        }
    }

    info!(
        applied = outcome.applied,
        rejected = outcome.rejected.len(),
        nodes = graph.node_count(),
        links = graph.edge_count(),
        "plan script finished"
    );
    Ok(outcome)
}

fn apply_step(
    graph: &mut FlowGraph,
    outcome: &mut ScriptOutcome,
    step: usize,
    action: &Step,
) -> Result<(), ScriptError> {
    let graph_err = |source| ScriptError::Graph { step, source };

    match action {
        Step::AddNode { alias, recipe } => {
            if outcome.node(alias).is_some() {
                return Err(ScriptError::DuplicateAlias {
                    step,
                    alias: alias.clone(),
                });
            }
            let recipe_id =
                graph
                    .catalog()
                    .recipe_id(recipe)
                    .ok_or_else(|| ScriptError::UnknownRecipe {
                        step,
                        key: recipe.clone(),
                    })?;
            let node = graph.add_node(recipe_id).map_err(graph_err)?;
            outcome.aliases.push((alias.clone(), node));
        }
        Step::RemoveNode { alias } => {
            let node = lookup(outcome, step, alias)?;
            graph.remove_node(node).map_err(graph_err)?;
            outcome.aliases.retain(|(name, _)| name != alias);
        }
        Step::Link {
            from,
            to,
            product,
            quantity,
        } => {
            let source = lookup(outcome, step, from)?;
            let target = lookup(outcome, step, to)?;
            let product = product_id(graph, step, product)?;
            let quantity = to_quantity(*quantity, Path::new("<script>"), "link")
                .map_err(|source| ScriptError::Quantity { step, source })?;
            graph
                .add_edge(source, product, target, quantity)
                .map_err(graph_err)?;
        }
        Step::Unlink { from, to, product } => {
            let edge = find_link(graph, outcome, step, from, to, product)?;
            graph.remove_edge(edge).map_err(graph_err)?;
        }
        Step::Requantify {
            from,
            to,
            product,
            quantity,
        } => {
            let edge = find_link(graph, outcome, step, from, to, product)?;
            let quantity = to_quantity(*quantity, Path::new("<script>"), "requantify")
                .map_err(|source| ScriptError::Quantity { step, source })?;
            graph.set_edge_quantity(edge, quantity).map_err(graph_err)?;
        }
    }
    Ok(())
}

fn lookup(outcome: &ScriptOutcome, step: usize, alias: &str) -> Result<NodeId, ScriptError> {
    outcome.node(alias).ok_or_else(|| ScriptError::UnknownAlias {
        step,
        alias: alias.to_string(),
    })
}

fn product_id(graph: &FlowGraph, step: usize, key: &str) -> Result<ProductId, ScriptError> {
    graph
        .catalog()
        .product_id(key)
        .ok_or_else(|| ScriptError::UnknownProduct {
            step,
            key: key.to_string(),
        })
}

fn find_link(
    graph: &FlowGraph,
    outcome: &ScriptOutcome,
    step: usize,
    from: &str,
    to: &str,
    product: &str,
) -> Result<EdgeId, ScriptError> {
    let source = lookup(outcome, step, from)?;
    let target = lookup(outcome, step, to)?;
    let product_id = product_id(graph, step, product)?;
    graph
        .links()
        .find(source, target, product_id)
        .ok_or_else(|| ScriptError::NoSuchLink {
            step,
            from: from.to_string(),
            to: to.to_string(),
            product: product.to_string(),
        })
}
