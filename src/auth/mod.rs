//! Console and tenant authentication
//!
//! Sessions are explicit objects with an issue time and an expiry, checked
//! on every privileged request by the gate middleware. Operator sessions
//! come from the API's `/api/auth/login`; tenant sessions wrap the bearer
//! token returned by `/api/tenant/login`.

pub mod cookies;
pub mod gate;
pub mod login;
pub mod session;

use thiserror::Error;

pub use cookies::{clear_cookie, cookie_value, session_cookie, SESSION_COOKIE, TENANT_COOKIE};
pub use gate::{require_session, require_tenant, safe_next};
pub use login::{console_login, tenant_login, Grant};
pub use session::{ConsoleSessions, Session, SessionStore, TenantSession, TenantSessions};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no session")]
    Missing,

    #[error("unknown session")]
    Unknown,

    #[error("session expired")]
    Expired,
}
