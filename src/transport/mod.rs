//! # Search Transport Trait
//!
//! This is THE contract between the graph facade and the outbound wire.
//! Retry policy, pooling, and auth all belong behind this seam — the core
//! never retries and holds no connection state of its own.
//!
//! ## Implementations
//!
//! | Transport | Module | Description |
//! |-----------|--------|-------------|
//! | `HttpTransport` | `http` | JSON POST over reqwest |
//! | test doubles | `tests/` | canned replies for round-trip tests |

pub mod http;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;

pub use http::HttpTransport;

/// One synchronous query against the search backend.
///
/// Implementations must map network failures and non-success statuses to
/// [`crate::Error::BackendUnavailable`] and undecodable bodies to
/// [`crate::Error::MalformedResponse`], carrying the request URL in both.
#[async_trait]
pub trait SearchTransport: Send + Sync + 'static {
    /// POST `body` as JSON to `url` and decode the JSON reply.
    async fn query(&self, url: &str, body: &Value) -> Result<Value>;
}
