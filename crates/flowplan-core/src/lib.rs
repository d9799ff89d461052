//! Flowplan Core -- the production flow graph behind a factory planner.
//!
//! A plan is a set of production nodes, each running one catalog recipe,
//! joined by product-typed links that carry a fixed quantity per cycle.
//! The graph keeps every port's fulfilled amount and `maxed` flag in step
//! with the links, and answers which nodes a port could still connect to.
//!
//! # Mutation Pattern
//!
//! Every mutation validates first and then commits in full; a rejected call
//! returns a [`graph::GraphError`] and leaves the graph untouched:
//!
//! ```rust,ignore
//! let mine = graph.add_node(mine_ore)?;
//! let smelter = graph.add_node(smelt_iron)?;
//! let edge = graph.add_edge(mine, iron_ore, smelter, qty(2.0))?;
//! graph.set_edge_quantity(edge, qty(1.0))?;
//! ```
//!
//! # Key Types
//!
//! - [`graph::FlowGraph`] -- Node store, link registry and mutator.
//! - [`catalog::Catalog`] -- Immutable products, machines and recipes
//!   (frozen at startup, shared behind an `Arc`).
//! - [`port::InputPort`] / [`port::OutputPort`] -- Per-product demand and
//!   supply slots with derived `maxed` and `satisfied` status.
//! - [`quantity::Quantity`] -- Q32.32 fixed-point amount, exact comparison.
//! - [`event::EventJournal`] -- Bounded journal of committed changes.
//! - [`query::NodeView`] -- Owned snapshot of a node for rendering.
//! - [`validation::audit`] -- From-scratch invariant check.

pub mod accounting;
pub mod catalog;
pub mod costs;
pub mod event;
pub mod graph;
pub mod id;
pub mod link;
pub mod node;
pub mod port;
pub mod quantity;
pub mod query;
pub mod resolver;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
