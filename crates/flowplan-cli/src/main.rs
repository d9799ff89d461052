//! Flowplan
//!
//! Applies plan scripts to a production flow graph and reports port status,
//! open link candidates and plan totals.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flowplan_core::catalog::{Catalog, MaintenanceKind, RecipeEntry};
use flowplan_core::graph::FlowGraph;
use flowplan_core::id::{Direction, NodeId};
use flowplan_core::query::{NodeView, PortView};
use flowplan_data::{load_catalog, load_script, run_script, ScriptOutcome};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "flowplan")]
#[command(about = "Production flow planner")]
struct Cli {
    /// Directory holding products, machines and recipes data files
    #[arg(short, long, default_value = "data", global = true)]
    data: PathBuf,

    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog recipes with their machine, inputs and outputs
    Recipes,

    /// Apply a plan script and print the resulting plan
    Run {
        /// Plan script (RON, TOML or JSON)
        script: PathBuf,

        /// Stop at the first rejected step
        #[arg(long)]
        strict: bool,

        /// Print node views as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let catalog = load_catalog(&cli.data)
        .with_context(|| format!("loading catalog from {}", cli.data.display()))?;

    match cli.command {
        Commands::Recipes => print_recipes(&catalog),
        Commands::Run {
            script,
            strict,
            json,
        } => run(Arc::new(catalog), &script, strict, json)?,
    }
    Ok(())
}

fn format_entries(catalog: &Catalog, entries: &[RecipeEntry]) -> String {
    if entries.is_empty() {
        return "-".to_string();
    }
    entries
        .iter()
        .map(|e| format!("{} {}", e.quantity, catalog.product_name(e.product)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn recipe_row(recipe: &str, machine: &str, inputs: &str, outputs: &str) -> String {
    format!("{recipe:<28} {machine:<22} {inputs:<36} {outputs}")
}

fn print_recipes(catalog: &Catalog) {
    println!("{}", recipe_row("Recipe", "Machine", "Inputs", "Outputs"));
    println!("{}", "-".repeat(110));
    for (_, recipe) in catalog.recipes() {
        let machine = catalog
            .get_machine(recipe.machine)
            .map(|m| m.name.as_str())
            .unwrap_or("?");
        println!(
            "{}",
            recipe_row(
                &recipe.key,
                machine,
                &format_entries(catalog, &recipe.inputs),
                &format_entries(catalog, &recipe.outputs),
            )
        );
    }
}

fn run(catalog: Arc<Catalog>, script_path: &Path, strict: bool, json: bool) -> Result<()> {
    let mut script = load_script(script_path)
        .with_context(|| format!("reading plan script {}", script_path.display()))?;
    script.strict |= strict;

    let mut graph = FlowGraph::new(catalog);
    let outcome = run_script(&mut graph, &script)?;
    let events = graph.drain_events();
    debug!(events = events.len(), "journal drained");

    let views = graph
        .node_ids()
        .iter()
        .map(|&id| graph.node_view(id))
        .collect::<Result<Vec<NodeView>, _>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    for view in &views {
        print_node(&graph, &outcome, view)?;
    }
    print_costs(&graph);

    if !outcome.rejected.is_empty() {
        println!("\nRejected steps:");
        for e in &outcome.rejected {
            println!("  {e}");
        }
    }
    info!(
        nodes = graph.node_count(),
        links = graph.edge_count(),
        "plan ready"
    );
    Ok(())
}

fn label(outcome: &ScriptOutcome, node: NodeId) -> String {
    outcome
        .alias_of(node)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{node:?}"))
}

fn print_node(graph: &FlowGraph, outcome: &ScriptOutcome, view: &NodeView) -> Result<()> {
    let recipe = graph
        .catalog()
        .get_recipe(view.recipe)
        .map(|r| r.name.as_str())
        .unwrap_or("?");
    let status = if view.is_satisfied() { "ok" } else { "open" };
    println!(
        "\n{} [{}] {} ({})",
        label(outcome, view.id),
        status,
        recipe,
        view.machine_name
    );

    for (direction, ports) in [
        (Direction::Input, view.inputs_by_name()),
        (Direction::Output, view.outputs_by_name()),
    ] {
        for port in ports {
            println!("  {:<6} {}", direction, format_port(port));
            if !port.maxed {
                let candidates = graph.candidates(view.id, direction, port.product)?;
                let names: Vec<String> = candidates.iter().map(|&n| label(outcome, n)).collect();
                println!("         candidates: {}", names.join(", "));
            }
        }
    }
    Ok(())
}

fn format_port(port: &PortView) -> String {
    let amount = if port.unbounded {
        format!("{} / unbounded", port.filled)
    } else {
        format!("{} / {}", port.filled, port.quantity)
    };
    let mut flags = Vec::new();
    if port.maxed {
        flags.push("maxed");
    }
    if port.satisfied {
        flags.push("satisfied");
    }
    format!("{:<22} {:<20} {}", port.name, amount, flags.join(" "))
}

fn print_costs(graph: &FlowGraph) {
    let catalog = graph.catalog();
    let costs = graph.plan_costs();
    println!("\nPlan totals ({} machines)", costs.machines);
    println!("  workers:     {}", costs.workers);
    println!("  electricity: {}", costs.electricity);
    println!("  computing:   {}", costs.computing);
    println!("  unity:       {}", costs.unity);
    for (kind, amount) in &costs.maintenance {
        let tier = match kind {
            MaintenanceKind::Tier1 => "I",
            MaintenanceKind::Tier2 => "II",
        };
        println!("  maintenance {tier}: {amount}");
    }
    for (&product, amount) in &costs.build_costs {
        println!("  build {}: {}", catalog.product_name(product), amount);
    }
}
