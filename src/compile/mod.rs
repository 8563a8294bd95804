//! # Request Compiler
//!
//! Turns an ordered sequence of query-node levels into the nested facet
//! request understood by the backend's analytical faceting engine, plus a
//! flat table of bound literal parameters.
//!
//! Pure functions — no I/O, no state, no transport dependency. The only
//! runtime failure is a malformed spec.
//!
//! ## Shape
//!
//! | Piece | Wire form |
//! |-------|-----------|
//! | root | `{"limit":0, "params":{...}, "facet":{...}}` |
//! | terms facet | `{"type":"terms","field":...,"limit":N,"mincount"?:N,...}` |
//! | query facet | `{"type":"query","query":"{!edismax ...}","limit"?:N,...}` |
//! | relatedness | nested `{"type":"func","func":"relatedness($fore,$back)"}` |
//!
//! Facets of level *i* are replicated onto **every** facet produced by level
//! *i−1* (a deliberate cross-product), so the result tree fans out correctly
//! when earlier levels themselves produced multiple branches. Replicas are
//! independent arena nodes, never aliases — later levels attach children
//! onto each replica individually.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::model::{QueryNode, RequestSpec};
use crate::{Error, Result};

/// Literal bindings keyed by `{facetKey}_query`, referenced from embedded
/// query strings at request time and used to resolve query-facet identities
/// at response time.
pub type ParamTable = BTreeMap<String, String>;

/// Default number of terms a terms facet returns.
pub const DEFAULT_TERMS_LIMIT: u32 = 10;

/// Output of [`compile`]: the wire body plus the parameter table that the
/// decompiler needs to resolve query facets. Both are owned by a single
/// traverse invocation.
#[derive(Debug, Clone)]
pub struct CompiledRequest {
    pub body: Value,
    pub params: ParamTable,
}

// ============================================================================
// Facet definitions
// ============================================================================

/// A single facet, tagged by kind.
///
/// A closed sum instead of a dynamically-shaped map: each variant knows how
/// to serialize itself, which removes any need for runtime type assertions
/// or deep-copy-by-reflection when replicating across parents.
#[derive(Debug, Clone, PartialEq)]
enum FacetDef {
    /// Backend enumerates the top-`limit` terms of `field`, ranked by
    /// relatedness descending.
    Terms {
        field: String,
        limit: u32,
        min_occurrence: Option<u32>,
        min_popularity: Option<u32>,
    },
    /// One fixed text query whose count and relatedness are measured.
    /// `param` names the literal binding in the [`ParamTable`].
    Query {
        field: String,
        param: String,
        operator: String,
        limit: Option<u32>,
        min_popularity: Option<u32>,
    },
}

/// Stable integer handle into the facet arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FacetId(usize);

struct FacetSlot {
    def: FacetDef,
    children: Vec<(String, FacetId)>,
}

/// Arena of facet nodes addressed by [`FacetId`]. Fan-out nesting mutates
/// replicas through handles, so no facet object is ever shared between two
/// parents.
#[derive(Default)]
struct FacetArena {
    slots: Vec<FacetSlot>,
}

impl FacetArena {
    fn alloc(&mut self, def: FacetDef) -> FacetId {
        self.slots.push(FacetSlot {
            def,
            children: Vec::new(),
        });
        FacetId(self.slots.len() - 1)
    }

    fn attach(&mut self, parent: FacetId, key: String, child: FacetId) {
        self.slots[parent.0].children.push((key, child));
    }

    fn render(&self, id: FacetId) -> Value {
        let slot = &self.slots[id.0];
        let mut obj = Map::new();
        match &slot.def {
            FacetDef::Terms {
                field,
                limit,
                min_occurrence,
                ..
            } => {
                obj.insert("type".into(), json!("terms"));
                obj.insert("field".into(), json!(field));
                obj.insert("limit".into(), json!(limit));
                if let Some(mincount) = min_occurrence {
                    obj.insert("mincount".into(), json!(mincount));
                }
            }
            FacetDef::Query {
                field,
                param,
                operator,
                limit,
                ..
            } => {
                obj.insert("type".into(), json!("query"));
                if !field.is_empty() {
                    obj.insert("field".into(), json!(field));
                }
                obj.insert(
                    "query".into(),
                    json!(format!("{{!edismax q.op={operator} qf={field} v=${param}}}")),
                );
                if let Some(limit) = limit {
                    obj.insert("limit".into(), json!(limit));
                }
            }
        }
        obj.insert("sort".into(), json!({"relatedness": "desc"}));

        // The relatedness sub-facet shares the map that holds next-level
        // child facets.
        let mut sub = Map::new();
        let mut rel = Map::new();
        rel.insert("type".into(), json!("func"));
        rel.insert("func".into(), json!("relatedness($fore,$back)"));
        let min_popularity = match &slot.def {
            FacetDef::Terms { min_popularity, .. } => min_popularity,
            FacetDef::Query { min_popularity, .. } => min_popularity,
        };
        if let Some(min_popularity) = min_popularity {
            rel.insert("min_popularity".into(), json!(min_popularity));
        }
        sub.insert("relatedness".into(), Value::Object(rel));
        for (key, child) in &slot.children {
            sub.insert(key.clone(), self.render(*child));
        }
        obj.insert("facet".into(), Value::Object(sub));
        Value::Object(obj)
    }
}

// ============================================================================
// Addressing
// ============================================================================

/// Deterministic default name for the node at `position` within level
/// `level`: `f{level}` for the first node, `f{level}_{position}` after.
///
/// Kept as an explicit function of the indices so the compiler and the
/// decompiler can be tested independently without a full round trip.
pub fn default_node_name(level: usize, position: usize) -> String {
    if position == 0 {
        format!("f{level}")
    } else {
        format!("f{level}_{position}")
    }
}

// ============================================================================
// Compilation
// ============================================================================

/// Compile a [`RequestSpec`] into the backend wire body and its parameter
/// table.
///
/// Fails only with [`Error::InvalidSpec`] when a node is neither a valid
/// query facet nor a valid terms facet — surfaced before any network call.
pub fn compile(spec: &RequestSpec) -> Result<CompiledRequest> {
    let mut arena = FacetArena::default();
    let mut params = ParamTable::new();
    let mut roots: Vec<(String, FacetId)> = Vec::new();

    // The working set of parents the next level attaches onto.
    // `None` stands for the request root.
    let mut parents: Vec<Option<FacetId>> = vec![None];

    for (i, level) in spec.levels.iter().enumerate() {
        let mut current: Vec<Option<FacetId>> = Vec::new();

        for (j, node) in level.iter().enumerate() {
            if node.values.is_empty() && node.field.is_empty() {
                return Err(Error::InvalidSpec(format!(
                    "node at level {i} position {j} has neither values nor a field"
                )));
            }

            let name = if node.name.is_empty() {
                default_node_name(i, j)
            } else {
                node.name.clone()
            };
            let defs = facet_defs(node, &name, &mut params);

            for parent in &parents {
                for (key, def) in &defs {
                    let id = arena.alloc(def.clone());
                    match parent {
                        Some(parent) => arena.attach(*parent, key.clone(), id),
                        None => roots.push((key.clone(), id)),
                    }
                    current.push(Some(id));
                }
            }
        }

        parents = current;
    }

    let body = render_root(&arena, &roots, &params);
    Ok(CompiledRequest { body, params })
}

/// Generate the facet definitions for one node, binding literal values into
/// `params` as a side effect.
///
/// Keys follow the positional addressing scheme: facet `{name}_{k}` with
/// binding `{name}_{k}_query` for the k-th literal value; a terms facet is
/// always `{name}_0`.
fn facet_defs(node: &QueryNode, name: &str, params: &mut ParamTable) -> Vec<(String, FacetDef)> {
    if node.is_query_facet() {
        node.values
            .iter()
            .enumerate()
            .map(|(k, value)| {
                let param = format!("{name}_{k}_query");
                params.insert(param.clone(), value.clone());
                let def = FacetDef::Query {
                    field: node.field.clone(),
                    param,
                    operator: node.operator().to_string(),
                    // mincount is not applicable to a fixed query;
                    // limit only when explicitly set.
                    limit: node.limit,
                    min_popularity: node.min_popularity,
                };
                (format!("{name}_{k}"), def)
            })
            .collect()
    } else {
        let def = FacetDef::Terms {
            field: node.field.clone(),
            limit: node.limit.unwrap_or(DEFAULT_TERMS_LIMIT),
            min_occurrence: node.min_occurrence,
            min_popularity: node.min_popularity,
        };
        vec![(format!("{name}_0"), def)]
    }
}

/// Root object: match-everything base query, the foreground/background
/// relatedness formula pair, the default analyzer type, every bound literal,
/// and the level-0 facet map.
fn render_root(arena: &FacetArena, roots: &[(String, FacetId)], params: &ParamTable) -> Value {
    let mut param_obj = Map::new();
    param_obj.insert("q".into(), json!("*:*"));
    param_obj.insert("fore".into(), json!("{!${defType} v=$q}"));
    param_obj.insert("back".into(), json!("*:*"));
    param_obj.insert("defType".into(), json!("edismax"));
    for (key, value) in params {
        param_obj.insert(key.clone(), json!(value));
    }

    let mut facet_obj = Map::new();
    for (key, id) in roots {
        facet_obj.insert(key.clone(), arena.render(*id));
    }

    json!({
        "limit": 0,
        "params": Value::Object(param_obj),
        "facet": Value::Object(facet_obj),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_default_node_name() {
        assert_eq!(default_node_name(0, 0), "f0");
        assert_eq!(default_node_name(1, 0), "f1");
        assert_eq!(default_node_name(1, 2), "f1_2");
    }

    #[test]
    fn test_root_shape() {
        let spec = RequestSpec::new();
        let compiled = compile(&spec).unwrap();
        assert_eq!(
            compiled.body,
            json!({
                "limit": 0,
                "params": {
                    "q": "*:*",
                    "fore": "{!${defType} v=$q}",
                    "back": "*:*",
                    "defType": "edismax",
                },
                "facet": {},
            })
        );
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_terms_facet_defaults() {
        let spec = RequestSpec::new().level([QueryNode::terms("text")]);
        let compiled = compile(&spec).unwrap();
        assert_eq!(
            compiled.body["facet"]["f0_0"],
            json!({
                "type": "terms",
                "field": "text",
                "limit": 10,
                "sort": {"relatedness": "desc"},
                "facet": {
                    "relatedness": {
                        "type": "func",
                        "func": "relatedness($fore,$back)",
                    },
                },
            })
        );
    }

    #[test]
    fn test_terms_facet_mincount_and_limit() {
        let spec = RequestSpec::new()
            .level([QueryNode::terms("text").with_min_occurrence(2).with_limit(8)]);
        let compiled = compile(&spec).unwrap();
        let facet = &compiled.body["facet"]["f0_0"];
        assert_eq!(facet["mincount"], 2);
        assert_eq!(facet["limit"], 8);
    }

    #[test]
    fn test_query_facet_per_value_with_bindings() {
        let spec = RequestSpec::new().level([QueryNode::query("text", ["cat", "dog"])]);
        let compiled = compile(&spec).unwrap();

        assert_eq!(compiled.params.get("f0_0_query"), Some(&"cat".to_string()));
        assert_eq!(compiled.params.get("f0_1_query"), Some(&"dog".to_string()));
        assert_eq!(compiled.body["params"]["f0_0_query"], "cat");
        assert_eq!(compiled.body["params"]["f0_1_query"], "dog");

        let facet = &compiled.body["facet"]["f0_0"];
        assert_eq!(facet["type"], "query");
        assert_eq!(facet["query"], "{!edismax q.op=AND qf=text v=$f0_0_query}");
        // mincount never applies to a query facet; limit only when set.
        assert!(facet.get("mincount").is_none());
        assert!(facet.get("limit").is_none());

        assert_eq!(
            compiled.body["facet"]["f0_1"]["query"],
            "{!edismax q.op=AND qf=text v=$f0_1_query}"
        );
    }

    #[test]
    fn test_query_facet_explicit_limit_and_operator() {
        let spec = RequestSpec::new()
            .level([QueryNode::query("text", ["cat"]).with_limit(5).with_operator("OR")]);
        let compiled = compile(&spec).unwrap();
        let facet = &compiled.body["facet"]["f0_0"];
        assert_eq!(facet["limit"], 5);
        assert_eq!(facet["query"], "{!edismax q.op=OR qf=text v=$f0_0_query}");
    }

    #[test]
    fn test_min_popularity_injected_into_relatedness() {
        let spec = RequestSpec::new().level([QueryNode::terms("text").with_min_popularity(3)]);
        let compiled = compile(&spec).unwrap();
        assert_eq!(
            compiled.body["facet"]["f0_0"]["facet"]["relatedness"]["min_popularity"],
            3
        );
    }

    #[test]
    fn test_explicit_name_wins() {
        let spec = RequestSpec::new()
            .level([QueryNode::query("text", ["cat"]).with_name("seed")]);
        let compiled = compile(&spec).unwrap();
        assert!(compiled.body["facet"]["seed_0"].is_object());
        assert_eq!(compiled.params.get("seed_0_query"), Some(&"cat".to_string()));
    }

    #[test]
    fn test_second_level_nests_under_first() {
        let spec = RequestSpec::new()
            .level([QueryNode::query("text", ["cat"])])
            .level([QueryNode::terms("text").with_limit(8)]);
        let compiled = compile(&spec).unwrap();
        let nested = &compiled.body["facet"]["f0_0"]["facet"]["f1_0"];
        assert_eq!(nested["type"], "terms");
        assert_eq!(nested["limit"], 8);
        // The relatedness sub-facet stays alongside the nested level.
        assert!(compiled.body["facet"]["f0_0"]["facet"]["relatedness"].is_object());
    }

    #[test]
    fn test_cross_product_replication() {
        // Two level-0 values, one level-1 terms node: the level-1 facet must
        // appear under each level-0 replica, independently.
        let spec = RequestSpec::new()
            .level([QueryNode::query("text", ["cat", "dog"])])
            .level([QueryNode::terms("text")]);
        let compiled = compile(&spec).unwrap();
        for key in ["f0_0", "f0_1"] {
            let nested = &compiled.body["facet"][key]["facet"]["f1_0"];
            assert_eq!(nested["type"], "terms", "missing level-1 facet under {key}");
        }
    }

    #[test]
    fn test_three_levels_deep() {
        let spec = RequestSpec::new()
            .level([QueryNode::query("text", ["cat"])])
            .level([QueryNode::query("text", ["dog"])])
            .level([QueryNode::terms("text")]);
        let compiled = compile(&spec).unwrap();
        let deep = &compiled.body["facet"]["f0_0"]["facet"]["f1_0"]["facet"]["f2_0"];
        assert_eq!(deep["type"], "terms");
    }

    #[test]
    fn test_multiple_nodes_per_level() {
        let spec = RequestSpec::new().level([
            QueryNode::terms("text"),
            QueryNode::terms("category"),
        ]);
        let compiled = compile(&spec).unwrap();
        assert_eq!(compiled.body["facet"]["f0_0"]["field"], "text");
        assert_eq!(compiled.body["facet"]["f0_1_0"]["field"], "category");
    }

    #[test]
    fn test_invalid_spec_rejected() {
        let spec = RequestSpec::new().level([QueryNode::default()]);
        let err = compile(&spec).unwrap_err();
        assert!(matches!(err, Error::InvalidSpec(_)), "got {err:?}");
    }

    #[test]
    fn test_compile_is_idempotent() {
        let spec = RequestSpec::new()
            .level([QueryNode::query("text", ["cat", "dog"])])
            .level([QueryNode::terms("text").with_min_occurrence(2)]);
        let a = compile(&spec).unwrap();
        let b = compile(&spec).unwrap();
        assert_eq!(a.body, b.body);
        assert_eq!(a.params, b.params);
    }

    proptest! {
        /// Default names are unique across (level, position) pairs within
        /// the practical addressing range.
        #[test]
        fn prop_default_names_unique(
            a in 0usize..16, b in 0usize..16,
            c in 0usize..16, d in 0usize..16,
        ) {
            prop_assume!((a, b) != (c, d));
            prop_assert_ne!(default_node_name(a, b), default_node_name(c, d));
        }
    }
}
