//! Result-side vocabulary: the typed tree rebuilt from a backend reply.

use serde::{Deserialize, Serialize};

/// Named group of result values produced by one logical query node.
///
/// The name is the request-time node name with its per-instance suffix
/// stripped (`f0_0` and `f0_1` both fold into `f0`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Traversal {
    pub name: String,
    pub values: Vec<Node>,
}

/// One resolved term or literal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// The term surfaced by a terms facet, or the literal value that
    /// produced a query facet (resolved via the parameter table).
    pub key: String,

    /// Backend-computed co-occurrence strength. Floored to 0.0 whenever the
    /// backing occurrence count is absent or not strictly positive, so
    /// degenerate zero-occurrence scores never leak into client code.
    pub relatedness: f64,

    /// Deeper nested traversals; empty for a leaf.
    pub traversals: Vec<Traversal>,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.traversals.is_empty()
    }
}

impl Traversal {
    /// Depth of the deepest Node chain below this traversal.
    pub fn depth(&self) -> usize {
        1 + self
            .values
            .iter()
            .flat_map(|n| n.traversals.iter())
            .map(Traversal::depth)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf() {
        let node = Node {
            key: "cat".into(),
            relatedness: 0.5,
            traversals: vec![],
        };
        assert!(node.is_leaf());
    }

    #[test]
    fn test_depth() {
        let leaf = Traversal {
            name: "f1".into(),
            values: vec![Node::default()],
        };
        let root = Traversal {
            name: "f0".into(),
            values: vec![Node {
                key: "cat".into(),
                relatedness: 0.0,
                traversals: vec![leaf],
            }],
        };
        assert_eq!(root.depth(), 2);
    }

    #[test]
    fn test_json_shape() {
        let t = Traversal {
            name: "f0".into(),
            values: vec![Node {
                key: "cat".into(),
                relatedness: 0.25,
                traversals: vec![],
            }],
        };
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["name"], "f0");
        assert_eq!(json["values"][0]["key"], "cat");
        assert_eq!(json["values"][0]["relatedness"], 0.25);
    }
}
