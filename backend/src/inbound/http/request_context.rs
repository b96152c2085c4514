//! Request metadata carried into error handling.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{Ready, ready};

/// Method and path of the request being answered.
///
/// Extracted from any handler signature; it never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    method: String,
    path: String,
}

impl RequestContext {
    /// Build a context by hand, e.g. in tests or background jobs.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }

    /// Context describing `request`.
    pub fn of(request: &HttpRequest) -> Self {
        Self::new(request.method().as_str(), request.path())
    }

    /// HTTP method, upper case.
    pub fn method(&self) -> &str {
        self.method.as_str()
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        self.path.as_str()
    }
}

impl FromRequest for RequestContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(request: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self::of(request)))
    }
}
