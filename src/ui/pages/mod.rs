//! Page components and their axum handlers.
//!
//! Each page is a Dioxus component that renders a full page using one of
//! the layouts; the handlers next to it fetch the data and render it.

pub mod analytics;
pub mod billing;
pub mod dashboard;
pub mod gateways;
pub mod goals;
pub mod login;
pub mod maintenance;
pub mod manual_entry;
pub mod meters;
pub mod reader;
pub mod remote;
pub mod sites;
pub mod tenant;

use crate::auth::Session;

/// The signed-in operator as shown in the layout
#[derive(Debug, Clone, PartialEq)]
pub struct Viewer {
    pub username: String,
    pub demo: bool,
}

impl From<&Session> for Viewer {
    fn from(session: &Session) -> Self {
        Self {
            username: session.username.clone(),
            demo: session.demo,
        }
    }
}

/// `selected` state for a filter option
pub(crate) fn is_selected(current: &Option<String>, value: &str) -> bool {
    current.as_deref() == Some(value)
}

/// Empty query-string values mean "no filter"
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn status_class(ok: bool) -> &'static str {
    if ok {
        "status-ok"
    } else {
        "status-err"
    }
}
