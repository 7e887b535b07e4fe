//! Metering API access with demo fallback
//!
//! Every page load goes through [`ApiClient::load`] (or one of its list and
//! record variants). Any failure, whether transport, HTTP status, non-JSON
//! content or an undecodable body, settles into [`Loaded::Demo`] when demo
//! fallback is enabled and [`Loaded::Failed`] otherwise. Valid JSON is
//! always [`Loaded::Live`], even when it is an empty list.

mod client;
pub mod envelope;
mod error;

pub use client::ApiClient;
pub use error::ApiError;

/// Outcome of a page-load fetch
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    Live(T),
    Demo(T),
    /// Fallback disabled; carries the operator-facing message
    Failed(String),
}

impl<T> Loaded<T> {
    pub fn resolve(
        result: Result<T, ApiError>,
        demo_fallback: bool,
        demo: impl FnOnce() -> T,
    ) -> Self {
        match result {
            Ok(data) => Loaded::Live(data),
            Err(_) if demo_fallback => Loaded::Demo(demo()),
            Err(e) => Loaded::Failed(e.user_message()),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Loaded::Live(data) | Loaded::Demo(data) => Some(data),
            Loaded::Failed(_) => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Loaded::Live(data) | Loaded::Demo(data) => Some(data),
            Loaded::Failed(_) => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Loaded::Live(_))
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, Loaded::Demo(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Loaded::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        match self {
            Loaded::Live(data) => Loaded::Live(f(data)),
            Loaded::Demo(data) => Loaded::Demo(f(data)),
            Loaded::Failed(message) => Loaded::Failed(message),
        }
    }
}
