//! # skg-rs — Semantic Knowledge Graph over Faceted Search
//!
//! Describes a multi-level exploration of a text corpus ("which terms
//! co-occur with X, and which terms co-occur with those") as a declarative
//! tree of query nodes, compiles it into the nested facet request of a
//! Solr-style analytical faceting engine, and decompiles the nested numeric
//! reply back into a typed tree of terms annotated with relatedness scores.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `SearchTransport` is the contract between the graph
//!    facade and the wire
//! 2. **Clean DTOs**: `QueryNode`, `Traversal`, `Node` cross all boundaries
//! 3. **Compiler owns nothing**: spec → request body is a pure function
//! 4. **Backend sort is authoritative**: the decompiler never re-orders
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skg_rs::{QueryNode, RequestSpec, SemanticKnowledgeGraph, SkgConfig};
//!
//! # async fn example() -> skg_rs::Result<()> {
//! let skg = SemanticKnowledgeGraph::connect(SkgConfig::from_env())?;
//!
//! // Which terms co-occur with "cat", and how strongly?
//! let spec = RequestSpec::new()
//!     .level([QueryNode::query("text", ["cat"])])
//!     .level([QueryNode::terms("text").with_min_occurrence(2).with_limit(8)]);
//!
//! let result = skg.traverse(&spec, "products").await?;
//! for traversal in result.values() {
//!     for node in &traversal.values {
//!         println!("{}: {}", node.key, node.relatedness);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod compile;
pub mod config;
pub mod decompile;
pub mod model;
pub mod related;
pub mod transport;

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{Node, QueryNode, RequestLevel, RequestSpec, Traversal};

// ============================================================================
// Re-exports: Compiler
// ============================================================================

pub use compile::{CompiledRequest, ParamTable, compile as compile_request};

// ============================================================================
// Re-exports: Transport & config
// ============================================================================

pub use config::SkgConfig;
pub use related::RelatedTerm;
pub use transport::{HttpTransport, SearchTransport};

// ============================================================================
// Top-level graph handle
// ============================================================================

/// The primary entry point. Wraps a [`SearchTransport`] and orchestrates
/// compile → dispatch → decompile.
///
/// Stateless per call: one `traverse` performs at most one outbound query,
/// and the compiled request plus its parameter table live only for that
/// call. Concurrent traversals share nothing.
pub struct SemanticKnowledgeGraph<T: SearchTransport> {
    config: SkgConfig,
    transport: T,
}

impl<T: SearchTransport> SemanticKnowledgeGraph<T> {
    /// Wrap an existing transport.
    pub fn with_transport(config: SkgConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Run one multi-level exploration against `collection`.
    ///
    /// An empty `collection` falls back to the configured default. Fails
    /// with [`Error::InvalidSpec`] before any network call when the spec is
    /// malformed, [`Error::BackendUnavailable`] when the transport call
    /// fails or returns non-success, and [`Error::MalformedResponse`] when
    /// the reply lacks the expected `facets` object or any facet cannot be
    /// interpreted.
    pub async fn traverse(
        &self,
        spec: &RequestSpec,
        collection: &str,
    ) -> Result<BTreeMap<String, Traversal>> {
        let collection = if collection.is_empty() {
            &self.config.default_collection
        } else {
            collection
        };

        let compiled = compile::compile(spec)?;
        let url = format!("{}/{}/query", self.config.base_url, collection);
        debug!(%url, body = %compiled.body, "compiled facet request");

        let reply = self.transport.query(&url, &compiled.body).await?;

        let facets = reply
            .get("facets")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::MalformedResponse {
                url: url.clone(),
                detail: "missing facets object".into(),
            })?;

        decompile::decompile(facets, &compiled.params).map_err(|err| err.with_url(&url))
    }

    /// Terms co-occurring with `keyword`, strongest first per the backend's
    /// own sort.
    pub async fn related_terms(
        &self,
        keyword: &str,
        collection: &str,
    ) -> Result<Vec<RelatedTerm>> {
        let spec = related::related_terms_spec(keyword);
        let result = self.traverse(&spec, collection).await?;
        Ok(related::extract_related_terms(&result))
    }

    /// Relatedness of each candidate `phrase` to `keyword`, sorted
    /// strongest first.
    pub async fn co_occurrence(
        &self,
        keyword: &str,
        phrases: &[String],
        collection: &str,
    ) -> Result<Vec<RelatedTerm>> {
        let spec = related::co_occurrence_spec(keyword, phrases.iter().cloned());
        let result = self.traverse(&spec, collection).await?;
        let mut terms = related::extract_related_terms(&result);
        related::sort_by_relatedness_desc(&mut terms);
        Ok(terms)
    }

    /// Access the underlying transport (for advanced use).
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// HTTP-backed graph for production use.
impl SemanticKnowledgeGraph<HttpTransport> {
    pub fn connect(config: SkgConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, transport))
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A query node is neither a valid query facet nor a valid terms facet.
    #[error("invalid request spec: {0}")]
    InvalidSpec(String),

    /// Network failure or non-success status from the transport. The core
    /// never retries; retry policy belongs to the transport collaborator.
    #[error("search backend unavailable at '{url}': {detail}")]
    BackendUnavailable { url: String, detail: String },

    /// The reply is missing the `facets` object, or a facet value cannot be
    /// interpreted as a mapping or bucket array.
    #[error("malformed backend response from '{url}': {detail}")]
    MalformedResponse { url: String, detail: String },
}

impl Error {
    /// Fill in the request URL on errors raised below the transport layer.
    pub(crate) fn with_url(self, url: &str) -> Self {
        match self {
            Error::BackendUnavailable { url: old, detail } if old.is_empty() => {
                Error::BackendUnavailable { url: url.to_string(), detail }
            }
            Error::MalformedResponse { url: old, detail } if old.is_empty() => {
                Error::MalformedResponse { url: url.to_string(), detail }
            }
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
