//! # Response Decompiler
//!
//! Walks the backend's arbitrarily deep nested facet response and rebuilds
//! the typed [`Traversal`]/[`Node`] tree, resolving each result back to the
//! literal value or indexed term that produced it.
//!
//! Recursive, single-threaded tree processing. The parameter table produced
//! at compile time is the source of truth for query-facet identities: a
//! query facet's reply carries no field value, so its key is the literal
//! bound under `{fieldName}_query` at compile time.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::compile::ParamTable;
use crate::model::{Node, Traversal};
use crate::{Error, Result};

/// Keys that describe the current response node rather than its children.
const RESERVED_KEYS: [&str; 3] = ["count", "relatedness", "val"];

/// Decompile one response node (initially the backend's top-level `facets`
/// object) into traversals grouped by logical node name.
///
/// Sibling facet fields sharing a group name after suffix-stripping
/// (`f1_0`, `f1_1` → `f1`) merge into one [`Traversal`]. Bucket order is
/// taken from the backend verbatim — the backend's relatedness-descending
/// sort is authoritative and no client-side re-sort is applied.
///
/// A facet that was requested but is absent from the reply yields no Node.
/// A facet value that is not an object, or a bucket list entry that is not
/// an object, fails the whole decompilation with
/// [`Error::MalformedResponse`] — partial trees are never half-returned.
pub fn decompile(
    node: &Map<String, Value>,
    params: &ParamTable,
) -> Result<BTreeMap<String, Traversal>> {
    let mut traversals: BTreeMap<String, Traversal> = BTreeMap::new();

    for (full_name, data) in node {
        if RESERVED_KEYS.contains(&full_name.as_str()) {
            continue;
        }

        let data = data.as_object().ok_or_else(|| {
            malformed(format!("facet '{full_name}' is not an object"))
        })?;

        let name = strip_suffix(full_name);
        let traversal = traversals
            .entry(name.to_string())
            .or_insert_with(|| Traversal {
                name: name.to_string(),
                values: Vec::new(),
            });

        if let Some(buckets) = data.get("buckets") {
            // Terms-facet shape: one Node per bucket, backend order kept.
            let buckets = buckets.as_array().ok_or_else(|| {
                malformed(format!("facet '{full_name}' buckets is not an array"))
            })?;
            for bucket in buckets {
                let bucket = bucket.as_object().ok_or_else(|| {
                    malformed(format!("facet '{full_name}' bucket is not an object"))
                })?;
                traversal.values.push(transform_node(bucket, None, params)?);
            }
        } else {
            // Query-facet shape: a single measured count + relatedness.
            traversal
                .values
                .push(transform_node(data, Some(full_name), params)?);
        }
    }

    Ok(traversals)
}

/// Transform one bucket or single facet object into a [`Node`].
///
/// `field_name` is present only for the query-facet shape, where the key
/// must be resolved through the parameter table.
fn transform_node(
    node: &Map<String, Value>,
    field_name: Option<&str>,
    params: &ParamTable,
) -> Result<Node> {
    let key = match node.get("val") {
        Some(val) => stringify(val),
        None => match field_name {
            Some(field_name) => resolve_param(field_name, params),
            None => String::new(),
        },
    };

    let traversals = decompile(node, params)?.into_values().collect();

    Ok(Node {
        key,
        relatedness: extract_relatedness(node),
        traversals,
    })
}

/// Relatedness of a response node, floored to 0.0 unless its `count` is
/// present and strictly positive. A zero-occurrence facet can carry a
/// degenerate score from the backend's formula; it must never surface.
fn extract_relatedness(node: &Map<String, Value>) -> f64 {
    let positive_count = node
        .get("count")
        .and_then(Value::as_f64)
        .is_some_and(|count| count > 0.0);
    if !positive_count {
        return 0.0;
    }

    node.get("relatedness")
        .and_then(Value::as_object)
        .and_then(|rel| rel.get("relatedness"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

/// Look up the literal bound for a query facet. An unresolvable binding
/// degrades to an empty key rather than failing the traversal — one
/// unresolved leaf must not void an otherwise-valid tree.
fn resolve_param(field_name: &str, params: &ParamTable) -> String {
    let key = format!("{field_name}_query");
    match params.get(&key) {
        Some(value) => value.clone(),
        None => {
            warn!(param = %key, "no binding for query facet, using empty key");
            String::new()
        }
    }
}

/// Strip the trailing `_{segment}` from a facet field name to recover its
/// logical group name: `f0_0` → `f0`. No underscore returns the input.
pub fn strip_suffix(name: &str) -> &str {
    match name.rsplit_once('_') {
        Some((prefix, _)) => prefix,
        None => name,
    }
}

fn stringify(val: &Value) -> String {
    match val {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn malformed(detail: String) -> Error {
    Error::MalformedResponse {
        url: String::new(),
        detail,
    }
}

// ============================================================================
// Tests
// ============================================================================
