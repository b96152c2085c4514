//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **identity**: reqwest-backed credential manager and user directory for
//!   the external identity service
//! - **logging**: `tracing`-backed diagnostic log
//! - **memory**: in-process member store
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod identity;
pub mod logging;
pub mod memory;
