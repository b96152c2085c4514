//! HTTP inbound adapter exposing REST endpoints and the terminal error
//! handler.

pub mod error;
pub mod error_handler;
pub mod health;
pub mod members;
pub mod request_context;
pub mod state;

pub use error::{ApiResult, ErrorBody, ErrorEnvelope, ErrorReply};
pub use error_handler::{ErrorHandler, Failure, UnknownFailure};
pub use request_context::RequestContext;
