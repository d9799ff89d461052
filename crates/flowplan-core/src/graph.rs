use crate::catalog::Catalog;
use crate::event::{EventJournal, GraphEvent};
use crate::id::*;
use crate::link::{Link, LinkRegistry};
use crate::node::ProductionNode;
use crate::quantity::Quantity;
use slotmap::SlotMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors returned by graph mutations and queries. A rejected mutation
/// leaves the graph exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("edge not found: {0:?}")]
    EdgeNotFound(EdgeId),
    #[error("recipe not found: {0:?}")]
    RecipeNotFound(RecipeId),
    #[error("machine not found: {0:?}")]
    MachineNotFound(MachineId),
    #[error("product mismatch: output carries {output:?}, input expects {input:?}")]
    ProductMismatch { output: ProductId, input: ProductId },
    #[error("node {node:?} has no {direction} port for {product:?}")]
    PortNotFound {
        node: NodeId,
        direction: Direction,
        product: ProductId,
    },
    #[error("invalid link quantity: {0}")]
    InvalidQuantity(Quantity),
    #[error(
        "over-allocation on {direction} {product:?} of node {node:?}: requested {requested}, available {available}"
    )]
    OverAllocation {
        node: NodeId,
        direction: Direction,
        product: ProductId,
        requested: Quantity,
        available: Quantity,
    },
    #[error("total on {direction} {product:?} of node {node:?} overflows when adding {requested}")]
    QuantityOverflow {
        node: NodeId,
        direction: Direction,
        product: ProductId,
        requested: Quantity,
    },
    #[error("cannot link node {0:?} to itself")]
    SelfLink(NodeId),
    #[error("link already exists: {0:?}")]
    DuplicateLink(EdgeId),
}

/// Coarse classification of [`GraphError`] for callers that only need to
/// decide how to present a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    ProductMismatch,
    PortNotFound,
    InvalidQuantity,
    OverAllocation,
    SelfLink,
    DuplicateLink,
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GraphError::NodeNotFound(_)
            | GraphError::EdgeNotFound(_)
            | GraphError::RecipeNotFound(_)
            | GraphError::MachineNotFound(_) => ErrorKind::NotFound,
            GraphError::ProductMismatch { .. } => ErrorKind::ProductMismatch,
            GraphError::PortNotFound { .. } => ErrorKind::PortNotFound,
            GraphError::InvalidQuantity(_) | GraphError::QuantityOverflow { .. } => {
                ErrorKind::InvalidQuantity
            }
            GraphError::OverAllocation { .. } => ErrorKind::OverAllocation,
            GraphError::SelfLink(_) => ErrorKind::SelfLink,
            GraphError::DuplicateLink(_) => ErrorKind::DuplicateLink,
        }
    }
}

// ---------------------------------------------------------------------------
// Link requests
// ---------------------------------------------------------------------------

/// A request to route `quantity` of a product from `source`'s output port to
/// `target`'s input port. Both product fields must name the same product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRequest {
    pub source: NodeId,
    pub source_product: ProductId,
    pub target: NodeId,
    pub target_product: ProductId,
    pub quantity: Quantity,
}

impl LinkRequest {
    pub fn new(source: NodeId, product: ProductId, target: NodeId, quantity: Quantity) -> Self {
        Self {
            source,
            source_product: product,
            target,
            target_product: product,
            quantity,
        }
    }
}

// ---------------------------------------------------------------------------
// FlowGraph
// ---------------------------------------------------------------------------

/// The production flow graph: placed nodes, product links between them, and
/// the derived port accounting.
///
/// Every mutation validates first and commits second, so a returned error
/// means nothing changed. After each commit the `maxed` flag of every port
/// whose candidate set could have moved is recomputed.
#[derive(Debug, Clone)]
pub struct FlowGraph {
    catalog: Arc<Catalog>,
    nodes: SlotMap<NodeId, ProductionNode>,
    /// Live nodes in creation order. Slot keys are reused, so the map's own
    /// iteration order is not stable enough for candidate ordering.
    order: Vec<NodeId>,
    links: LinkRegistry,
    journal: EventJournal,
}

impl FlowGraph {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_journal_capacity(catalog, crate::event::DEFAULT_JOURNAL_CAPACITY)
    }

    pub fn with_journal_capacity(catalog: Arc<Catalog>, capacity: usize) -> Self {
        Self {
            catalog,
            nodes: SlotMap::with_key(),
            order: Vec::new(),
            links: LinkRegistry::new(),
            journal: EventJournal::new(capacity),
        }
    }

    // -----------------------------------------------------------------------
    // Node lifecycle
    // -----------------------------------------------------------------------

    /// Place a node running `recipe`. Ports start empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use flowplan_core::catalog::{CatalogBuilder, RecipeEntry};
    /// use flowplan_core::graph::FlowGraph;
    /// use flowplan_core::quantity::qty;
    /// use std::sync::Arc;
    ///
    /// let mut b = CatalogBuilder::new();
    /// let ore = b.register_product("ore", "Ore");
    /// let mine = b.register_machine("mine", "Mine");
    /// let dig = b.register_recipe("dig", mine, vec![], vec![RecipeEntry::new(ore, qty(0.0))]);
    ///
    /// let mut graph = FlowGraph::new(Arc::new(b.build().unwrap()));
    /// let node = graph.add_node(dig).unwrap();
    /// assert!(graph.get_node(node).unwrap().output(ore).unwrap().is_unbounded());
    /// ```
    pub fn add_node(&mut self, recipe: RecipeId) -> Result<NodeId, GraphError> {
        let catalog = Arc::clone(&self.catalog);
        let def = catalog
            .get_recipe(recipe)
            .ok_or(GraphError::RecipeNotFound(recipe))?;

        let node = self
            .nodes
            .insert_with_key(|id| ProductionNode::instantiate(id, recipe, def));
        self.order.push(node);
        self.links.attach_node(node);
        self.journal.push(GraphEvent::NodeAdded { node, recipe });

        let products: Vec<ProductId> = self.nodes[node].products().collect();
        self.refresh_products(&products, &[]);
        Ok(node)
    }

    /// Remove a node and every link touching it, then re-derive the
    /// neighbouring ports.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), GraphError> {
        let removed_node = self
            .nodes
            .remove(node)
            .ok_or(GraphError::NodeNotFound(node))?;
        self.order.retain(|&n| n != node);

        let removed_links = self.links.detach_node(node);
        let mut touched = Vec::new();
        for (edge, link) in &removed_links {
            let neighbour = if link.source == node {
                link.target
            } else {
                link.source
            };
            self.resync_port_totals(neighbour, link.product);
            touched.push(neighbour);
            self.journal.push(GraphEvent::EdgeRemoved { edge: *edge });
        }
        self.journal.push(GraphEvent::NodeRemoved { node });

        let products: Vec<ProductId> = removed_node.products().collect();
        self.refresh_products(&products, &touched);
        Ok(())
    }

    pub fn get_node(&self, node: NodeId) -> Result<&ProductionNode, GraphError> {
        self.nodes.get(node).ok_or(GraphError::NodeNotFound(node))
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    /// Live node IDs in creation order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    /// Live nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &ProductionNode> {
        self.order.iter().filter_map(|&id| self.nodes.get(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // -----------------------------------------------------------------------
    // Link lifecycle
    // -----------------------------------------------------------------------

    /// Link `quantity` of `product` from `source` to `target`.
    pub fn add_edge(
        &mut self,
        source: NodeId,
        product: ProductId,
        target: NodeId,
        quantity: Quantity,
    ) -> Result<EdgeId, GraphError> {
        self.add_link(LinkRequest::new(source, product, target, quantity))
    }

    /// Validate and commit a link. Checks run in a fixed order and the
    /// first failure is returned:
    ///
    /// 1. both nodes exist (source first)
    /// 2. the two products match
    /// 3. the source has the output port, then the target has the input port
    /// 4. source and target differ
    /// 5. no link already joins the same ports
    /// 6. the quantity is positive
    /// 7. the source port can supply it (skipped for unbounded sources)
    /// 8. the target port can absorb it
    pub fn add_link(&mut self, request: LinkRequest) -> Result<EdgeId, GraphError> {
        self.validate_link(&request)?;

        let LinkRequest {
            source,
            source_product: product,
            target,
            quantity,
            ..
        } = request;

        let edge = self.links.insert(Link {
            source,
            target,
            product,
            quantity,
        });
        if let Some(port) = self.nodes.get_mut(source).and_then(|n| n.output_mut(product)) {
            let exported = port.exported() + quantity;
            port.set_exported(exported);
        }
        if let Some(port) = self.nodes.get_mut(target).and_then(|n| n.input_mut(product)) {
            let imported = port.imported() + quantity;
            port.set_imported(imported);
        }

        self.journal.push(GraphEvent::EdgeAdded {
            edge,
            source,
            target,
            product,
            quantity,
        });
        self.refresh_products(&[product], &[source, target]);
        Ok(edge)
    }

    fn validate_link(&self, request: &LinkRequest) -> Result<(), GraphError> {
        let source = self.get_node(request.source)?;
        let target = self.get_node(request.target)?;

        if request.source_product != request.target_product {
            return Err(GraphError::ProductMismatch {
                output: request.source_product,
                input: request.target_product,
            });
        }
        let product = request.source_product;

        let output = source.output(product).ok_or(GraphError::PortNotFound {
            node: request.source,
            direction: Direction::Output,
            product,
        })?;
        let input = target.input(product).ok_or(GraphError::PortNotFound {
            node: request.target,
            direction: Direction::Input,
            product,
        })?;

        if request.source == request.target {
            return Err(GraphError::SelfLink(request.source));
        }
        if let Some(existing) = self.links.find(request.source, request.target, product) {
            return Err(GraphError::DuplicateLink(existing));
        }
        if request.quantity <= Quantity::ZERO {
            return Err(GraphError::InvalidQuantity(request.quantity));
        }
        if output.is_unbounded() && output.exported().checked_add(request.quantity).is_none() {
            return Err(GraphError::QuantityOverflow {
                node: request.source,
                direction: Direction::Output,
                product,
                requested: request.quantity,
            });
        }
        if !output.can_supply(request.quantity) {
            return Err(GraphError::OverAllocation {
                node: request.source,
                direction: Direction::Output,
                product,
                requested: request.quantity,
                available: output.remaining().unwrap_or(Quantity::MAX),
            });
        }
        if !input.can_accept(request.quantity) {
            return Err(GraphError::OverAllocation {
                node: request.target,
                direction: Direction::Input,
                product,
                requested: request.quantity,
                available: input.remaining(),
            });
        }
        Ok(())
    }

    /// Delete a link and give its quantity back to both ports.
    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<(), GraphError> {
        let link = self.links.remove(edge).ok_or(GraphError::EdgeNotFound(edge))?;

        if let Some(port) = self
            .nodes
            .get_mut(link.source)
            .and_then(|n| n.output_mut(link.product))
        {
            let exported = port.exported() - link.quantity;
            port.set_exported(exported);
        }
        if let Some(port) = self
            .nodes
            .get_mut(link.target)
            .and_then(|n| n.input_mut(link.product))
        {
            let imported = port.imported() - link.quantity;
            port.set_imported(imported);
        }

        self.journal.push(GraphEvent::EdgeRemoved { edge });
        self.refresh_products(&[link.product], &[link.source, link.target]);
        Ok(())
    }

    /// Change the quantity a link carries. Zero deletes the link; the new
    /// amount must fit both ports once the old amount is given back.
    pub fn set_edge_quantity(&mut self, edge: EdgeId, quantity: Quantity) -> Result<(), GraphError> {
        let link = self.get_edge(edge)?.clone();
        if quantity < Quantity::ZERO {
            return Err(GraphError::InvalidQuantity(quantity));
        }
        if quantity == Quantity::ZERO {
            return self.remove_edge(edge);
        }
        if quantity == link.quantity {
            return Ok(());
        }

        let source = self.get_node(link.source)?;
        let target = self.get_node(link.target)?;
        let output = source.output(link.product).ok_or(GraphError::PortNotFound {
            node: link.source,
            direction: Direction::Output,
            product: link.product,
        })?;
        let input = target.input(link.product).ok_or(GraphError::PortNotFound {
            node: link.target,
            direction: Direction::Input,
            product: link.product,
        })?;

        // Totals with this link's old amount given back first.
        let new_exported = match (output.exported() - link.quantity).checked_add(quantity) {
            Some(total) if output.is_unbounded() || total <= output.quantity() => total,
            None if output.is_unbounded() => {
                return Err(GraphError::QuantityOverflow {
                    node: link.source,
                    direction: Direction::Output,
                    product: link.product,
                    requested: quantity,
                });
            }
            _ => {
                return Err(GraphError::OverAllocation {
                    node: link.source,
                    direction: Direction::Output,
                    product: link.product,
                    requested: quantity,
                    available: output.quantity() - output.exported() + link.quantity,
                });
            }
        };
        let new_imported = match (input.imported() - link.quantity).checked_add(quantity) {
            Some(total) if total <= input.quantity() => total,
            _ => {
                return Err(GraphError::OverAllocation {
                    node: link.target,
                    direction: Direction::Input,
                    product: link.product,
                    requested: quantity,
                    available: input.quantity() - input.imported() + link.quantity,
                });
            }
        };

        self.links.set_quantity(edge, quantity);
        if let Some(port) = self
            .nodes
            .get_mut(link.source)
            .and_then(|n| n.output_mut(link.product))
        {
            port.set_exported(new_exported);
        }
        if let Some(port) = self
            .nodes
            .get_mut(link.target)
            .and_then(|n| n.input_mut(link.product))
        {
            port.set_imported(new_imported);
        }

        self.journal.push(GraphEvent::EdgeRequantified {
            edge,
            from: link.quantity,
            to: quantity,
        });
        self.refresh_products(&[link.product], &[link.source, link.target]);
        Ok(())
    }

    pub fn get_edge(&self, edge: EdgeId) -> Result<&Link, GraphError> {
        self.links.get(edge).ok_or(GraphError::EdgeNotFound(edge))
    }

    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.links.contains(edge)
    }

    /// Read-only access to the link registry.
    pub fn links(&self) -> &LinkRegistry {
        &self.links
    }

    pub fn edge_count(&self) -> usize {
        self.links.len()
    }

    /// Links arriving at `node`'s `product` input, in insertion order.
    pub fn incoming_links(
        &self,
        node: NodeId,
        product: ProductId,
    ) -> Result<Vec<(EdgeId, &Link)>, GraphError> {
        self.get_node(node)?;
        Ok(self
            .links
            .incoming(node)
            .iter()
            .filter_map(|&e| self.links.get(e).map(|l| (e, l)))
            .filter(|(_, l)| l.product == product)
            .collect())
    }

    /// Links leaving `node`'s `product` output, in insertion order.
    pub fn outgoing_links(
        &self,
        node: NodeId,
        product: ProductId,
    ) -> Result<Vec<(EdgeId, &Link)>, GraphError> {
        self.get_node(node)?;
        Ok(self
            .links
            .outgoing(node)
            .iter()
            .filter_map(|&e| self.links.get(e).map(|l| (e, l)))
            .filter(|(_, l)| l.product == product)
            .collect())
    }

    // -----------------------------------------------------------------------
    // Collaborators
    // -----------------------------------------------------------------------

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Committed changes not yet drained.
    pub fn events(&self) -> &EventJournal {
        &self.journal
    }

    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        self.journal.drain()
    }

    // -----------------------------------------------------------------------
    // Crate-internal access for accounting and resolver
    // -----------------------------------------------------------------------

    pub(crate) fn node_mut(&mut self, node: NodeId) -> Option<&mut ProductionNode> {
        self.nodes.get_mut(node)
    }

    pub(crate) fn push_event(&mut self, event: GraphEvent) {
        self.journal.push(event);
    }
}
