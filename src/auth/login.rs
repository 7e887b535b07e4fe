//! Credential checks against the metering API

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::DemoConfig;
use crate::model::TenantLogin;
use crate::upstream::{ApiClient, ApiError};

const DEFAULT_ROLE: &str = "operator";

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct TenantCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Who the API says signed in
#[derive(Debug, Clone, PartialEq)]
pub struct Grant {
    pub username: String,
    pub role: String,
    pub demo: bool,
}

fn demo_credentials_match(demo: &DemoConfig, username: &str, password: &str) -> bool {
    demo.fallback
        && matches!(
            (&demo.username, &demo.password),
            (Some(u), Some(p)) if u == username && p == password
        )
}

fn rejection(err: &ApiError) -> String {
    match err {
        ApiError::Status { message: None, status: 401 | 403 } => {
            "Invalid username or password".to_string()
        }
        other => other.user_message(),
    }
}

fn role_of(body: &Value) -> String {
    body.get("role")
        .or_else(|| body.get("user").and_then(|u| u.get("role")))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_ROLE)
        .to_string()
}

pub async fn console_login(
    api: &ApiClient,
    demo: &DemoConfig,
    username: &str,
    password: &str,
) -> Result<Grant, String> {
    if username.trim().is_empty() || password.is_empty() {
        return Err("Username and password are required".to_string());
    }
    let result: Result<Value, ApiError> = api
        .post_json("/api/auth/login", &Credentials { username, password })
        .await;
    match result {
        Ok(body) => {
            info!(username, "operator signed in");
            Ok(Grant {
                username: username.to_string(),
                role: role_of(&body),
                demo: false,
            })
        }
        Err(e) if e.is_unavailable() && demo_credentials_match(demo, username, password) => {
            warn!(username, error = %e, "API unreachable, granting demo session");
            Ok(Grant {
                username: username.to_string(),
                role: DEFAULT_ROLE.to_string(),
                demo: true,
            })
        }
        Err(e) => {
            warn!(username, error = %e, "operator sign-in refused");
            Err(rejection(&e))
        }
    }
}

/// Tenant sign-in; returns the bearer login and whether it is a demo grant
pub async fn tenant_login(
    api: &ApiClient,
    demo: &DemoConfig,
    email: &str,
    password: &str,
) -> Result<(TenantLogin, bool), String> {
    if email.trim().is_empty() || password.is_empty() {
        return Err("Email and password are required".to_string());
    }
    let result: Result<TenantLogin, ApiError> = api
        .post_json("/api/tenant/login", &TenantCredentials { email, password })
        .await;
    match result {
        Ok(login) => Ok((login, false)),
        Err(e) if e.is_unavailable() && demo_credentials_match(demo, email, password) => {
            warn!(error = %e, "API unreachable, granting demo tenant session");
            Ok((
                TenantLogin {
                    token: "demo".to_string(),
                    expires_in: None,
                },
                true,
            ))
        }
        Err(e) => Err(rejection(&e)),
    }
}
