//! # Traversal Model
//!
//! Clean DTOs that define the semantic knowledge graph vocabulary.
//! These types cross every boundary: HTTP caller ↔ compiler ↔ decompiler ↔ user.
//!
//! Design rule: NO wire-format types, NO transport types here.
//! This module is pure data — no I/O, no state, no async.

pub mod query;
pub mod result;

pub use query::{QueryNode, RequestLevel, RequestSpec};
pub use result::{Node, Traversal};
