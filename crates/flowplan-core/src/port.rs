//! Per-product ports on a production node.
//!
//! A port's `quantity` is fixed at node creation. Only the graph mutator
//! changes `imported`/`exported` and the derived `maxed` flag; everything
//! outside the crate sees read-only accessors.

use crate::catalog::MachineDef;
use crate::id::ProductId;
use crate::quantity::{Quantity, is_unbounded};
use serde::{Deserialize, Serialize};

/// A demand slot: how much of a product the node needs per cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPort {
    product: ProductId,
    quantity: Quantity,
    imported: Quantity,
    maxed: bool,
}

impl InputPort {
    pub(crate) fn new(product: ProductId, quantity: Quantity) -> Self {
        Self {
            product,
            quantity,
            imported: Quantity::ZERO,
            maxed: false,
        }
    }

    pub fn product(&self) -> ProductId {
        self.product
    }

    /// Required amount.
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Sum of incoming link quantities.
    pub fn imported(&self) -> Quantity {
        self.imported
    }

    /// Whether the "add source" affordance should be hidden.
    pub fn maxed(&self) -> bool {
        self.maxed
    }

    /// Amount still missing, never negative.
    pub fn remaining(&self) -> Quantity {
        (self.quantity - self.imported).max(Quantity::ZERO)
    }

    /// Whether accepting `extra` more would stay within the demand.
    pub(crate) fn can_accept(&self, extra: Quantity) -> bool {
        self.imported
            .checked_add(extra)
            .is_some_and(|total| total <= self.quantity)
    }

    pub(crate) fn set_imported(&mut self, imported: Quantity) {
        self.imported = imported;
    }

    pub(crate) fn set_maxed(&mut self, maxed: bool) {
        self.maxed = maxed;
    }

    /// Demand met, or no producer left to offer.
    pub(crate) fn derive_maxed(&self, has_candidates: bool) -> bool {
        self.imported >= self.quantity || !has_candidates
    }

    /// Storage machines accept whatever arrives; everything else needs an
    /// exact match.
    pub fn is_satisfied(&self, machine: &MachineDef) -> bool {
        machine.is_storage || self.imported == self.quantity
    }
}

/// A supply slot: how much of a product the node makes per cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPort {
    product: ProductId,
    quantity: Quantity,
    exported: Quantity,
    maxed: bool,
}

impl OutputPort {
    pub(crate) fn new(product: ProductId, quantity: Quantity) -> Self {
        Self {
            product,
            quantity,
            exported: Quantity::ZERO,
            maxed: false,
        }
    }

    pub fn product(&self) -> ProductId {
        self.product
    }

    /// Produced amount. Below one means unbounded.
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Sum of outgoing link quantities.
    pub fn exported(&self) -> Quantity {
        self.exported
    }

    pub fn maxed(&self) -> bool {
        self.maxed
    }

    pub fn is_unbounded(&self) -> bool {
        is_unbounded(self.quantity)
    }

    /// Amount still unallocated; `None` for unbounded sources.
    pub fn remaining(&self) -> Option<Quantity> {
        if self.is_unbounded() {
            None
        } else {
            Some((self.quantity - self.exported).max(Quantity::ZERO))
        }
    }

    pub(crate) fn can_supply(&self, extra: Quantity) -> bool {
        match self.exported.checked_add(extra) {
            Some(total) => self.is_unbounded() || total <= self.quantity,
            None => false,
        }
    }

    pub(crate) fn set_exported(&mut self, exported: Quantity) {
        self.exported = exported;
    }

    pub(crate) fn set_maxed(&mut self, maxed: bool) {
        self.maxed = maxed;
    }

    /// Unbounded sources are only ever limited by candidate exhaustion.
    pub(crate) fn derive_maxed(&self, has_candidates: bool) -> bool {
        if self.is_unbounded() {
            !has_candidates
        } else {
            self.exported >= self.quantity || !has_candidates
        }
    }

    pub fn is_satisfied(&self, machine: &MachineDef) -> bool {
        machine.is_storage
            || machine.is_mine
            || self.is_unbounded()
            || self.exported == self.quantity
    }
}
