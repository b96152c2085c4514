//! Organisation admin backend.
//!
//! Keeps member records consistent between an external identity service and
//! the local store, and turns every failure into a logged, client-safe HTTP
//! reply.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;

/// Public OpenAPI surface used by tooling.
pub use doc::ApiDoc;
