//! Query-side vocabulary: one `QueryNode` describes one facet step.

use serde::{Deserialize, Serialize};

/// One step of exploration at one nesting level.
///
/// The discriminator is `values`: a node with literal `values` becomes one
/// **query facet per value** (a fixed text query whose count and relatedness
/// are measured); a node with empty `values` becomes a **terms facet** (the
/// backend enumerates up to `limit` most related terms of `field`). A node is
/// never both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryNode {
    /// Logical identifier. If empty, a deterministic default is assigned
    /// from (level index, position within level).
    pub name: String,

    /// Literal values to measure. Non-empty ⇒ query facet, one per value.
    pub values: Vec<String>,

    /// Indexed field to query or facet on.
    pub field: String,

    /// Minimum document count filter. Terms facets only.
    pub min_occurrence: Option<u32>,

    /// Maximum number of terms returned. Defaults to 10 for terms facets;
    /// omitted for query facets unless explicitly set.
    pub limit: Option<u32>,

    /// Floor on either side's popularity in the relatedness computation.
    pub min_popularity: Option<u32>,

    /// Boolean operator combining multiple terms of a query-facet value.
    /// Empty means "AND".
    pub default_operator: String,
}

impl QueryNode {
    /// A terms facet enumerating `field`.
    pub fn terms(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    /// A query facet measuring each of `values` against `field`.
    pub fn query<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// True when literal `values` drive this node.
    pub fn is_query_facet(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_min_occurrence(mut self, min: u32) -> Self {
        self.min_occurrence = Some(min);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_min_popularity(mut self, min: u32) -> Self {
        self.min_popularity = Some(min);
        self
    }

    pub fn with_operator(mut self, op: impl Into<String>) -> Self {
        self.default_operator = op.into();
        self
    }

    /// The operator used in the embedded text query, defaulting to "AND".
    pub fn operator(&self) -> &str {
        if self.default_operator.is_empty() {
            "AND"
        } else {
            &self.default_operator
        }
    }
}

/// Nodes evaluated together at one nesting depth.
pub type RequestLevel = Vec<QueryNode>;

/// Ordered sequence of levels. Level 0 nests under the root; level 1 nests
/// under every facet produced by level 0; and so on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestSpec {
    pub levels: Vec<RequestLevel>,
}

impl RequestSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one level of nodes, returning self for chaining.
    pub fn level<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = QueryNode>,
    {
        self.levels.push(nodes.into_iter().collect());
        self
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl From<Vec<RequestLevel>> for RequestSpec {
    fn from(levels: Vec<RequestLevel>) -> Self {
        Self { levels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_discriminator() {
        assert!(!QueryNode::terms("text").is_query_facet());
        assert!(QueryNode::query("text", ["cat"]).is_query_facet());
    }

    #[test]
    fn test_operator_default() {
        assert_eq!(QueryNode::terms("text").operator(), "AND");
        assert_eq!(QueryNode::terms("text").with_operator("OR").operator(), "OR");
    }

    #[test]
    fn test_spec_builder() {
        let spec = RequestSpec::new()
            .level([QueryNode::query("text", ["cat"])])
            .level([QueryNode::terms("text").with_limit(8)]);
        assert_eq!(spec.depth(), 2);
        assert_eq!(spec.levels[1][0].limit, Some(8));
    }

    #[test]
    fn test_serde_field_names() {
        let node = QueryNode::terms("text").with_min_occurrence(2);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["minOccurrence"], 2);
        assert_eq!(json["field"], "text");
    }
}
