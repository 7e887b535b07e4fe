//! Mock servers for integration testing
//!
//! The metering API mock answers canned responses per method and path so
//! page loads, sign-in and reader polling can be tested without a backend.

pub mod metering;

pub use metering::{unreachable_base_url, MockMeteringApi, Recorded};
