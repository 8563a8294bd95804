//! Related-term helpers layered on top of [`traverse`](crate::SemanticKnowledgeGraph::traverse).
//!
//! These are the canned explorations an HTTP handler typically exposes:
//! "which terms co-occur with this keyword", and "how related are these
//! candidate phrases to this keyword". The candidate phrases come from an
//! external tokenizer; this module only shapes specs and flattens results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{QueryNode, RequestSpec, Traversal};

/// One term related to an input keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedTerm {
    pub term: String,
    pub relatedness: f64,
}

/// Spec for "terms co-occurring with `keyword`": a query facet anchoring the
/// keyword, nested with a terms enumeration of the same field.
pub fn related_terms_spec(keyword: impl Into<String>) -> RequestSpec {
    RequestSpec::new()
        .level([QueryNode::query("text", [keyword.into()])])
        .level([
            QueryNode::terms("text")
                .with_min_occurrence(2)
                .with_limit(8),
        ])
}

/// Spec measuring each candidate `phrase` against `keyword`: both levels are
/// query facets, so every phrase gets its own measured count + relatedness
/// under the keyword's branch.
pub fn co_occurrence_spec<I, S>(keyword: impl Into<String>, phrases: I) -> RequestSpec
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    RequestSpec::new()
        .level([QueryNode::query("text", [keyword.into()])])
        .level([QueryNode::query("text", phrases)])
}

/// Flatten a traverse result into (term, relatedness) pairs: for each
/// top-level traversal, the nested traversals of its first node are the
/// terms related to the anchor.
pub fn extract_related_terms(result: &BTreeMap<String, Traversal>) -> Vec<RelatedTerm> {
    let mut terms = Vec::new();
    for traversal in result.values() {
        let Some(anchor) = traversal.values.first() else {
            continue;
        };
        for nested in &anchor.traversals {
            for node in &nested.values {
                terms.push(RelatedTerm {
                    term: node.key.clone(),
                    relatedness: node.relatedness,
                });
            }
        }
    }
    terms
}

/// Order strongest-first. The co-occurrence path needs this because its
/// level-1 query facets come back in field order, not score order.
pub fn sort_by_relatedness_desc(terms: &mut [RelatedTerm]) {
    terms.sort_by(|a, b| {
        b.relatedness
            .partial_cmp(&a.relatedness)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
