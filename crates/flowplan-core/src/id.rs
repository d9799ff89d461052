use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a placed production node in the flow graph.
    pub struct NodeId;

    /// Identifies a product link between two nodes.
    pub struct EdgeId;
}

/// Identifies a product in the catalog. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub u32);

/// Identifies a machine in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineId(pub u32);

/// Identifies a recipe in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

/// Which side of a node a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// The side a link on this port connects to on the other node.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => f.pad("input"),
            Direction::Output => f.pad("output"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_equality() {
        let a = ProductId(0);
        let b = ProductId(0);
        let c = ProductId(1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ProductId(0), "iron_ore");
        map.insert(ProductId(1), "iron_plate");
        assert_eq!(map[&ProductId(0)], "iron_ore");
    }

    #[test]
    fn direction_opposite_round_trips() {
        assert_eq!(Direction::Input.opposite(), Direction::Output);
        assert_eq!(Direction::Output.opposite().opposite(), Direction::Output);
        assert_eq!(Direction::Input.to_string(), "input");
    }
}
