//! Tenant portal: sign-in, overview, consumption and invoices.
//!
//! Tenant pages call `/api/tenant/*` with the bearer token held in the
//! tenant session. When the API rejects that token the session is dropped
//! and the tenant is sent back to sign in.

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use dioxus::prelude::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::analytics::{consumption_chart, consumption_table};
use super::billing::invoice_table;
use crate::api::AppState;
use crate::auth::gate::TENANT_LOGIN_PATH;
use crate::auth::{
    clear_cookie, cookie_value, session_cookie, tenant_login, TenantSession, TENANT_COOKIE,
};
use crate::bus::BusEvent;
use crate::demo;
use crate::model::{ConsumptionPoint, Invoice, TenantProfile};
use crate::ui::components::widgets::{money, number, text};
use crate::ui::components::{loaded_view, Chart, EmptyState, PublicLayout, StatCard, TenantLayout};
use crate::ui::render;
use crate::upstream::{ApiError, Loaded};

const PROFILE_PATH: &str = "/api/tenant/profile";
const CONSUMPTION_PATH: &str = "/api/tenant/consumption";
const INVOICES_PATH: &str = "/api/tenant/invoices";

// =============================================================================
// Sign-in
// =============================================================================

#[component]
pub fn TenantLoginPage(email: String, error: Option<String>, expired: bool) -> Element {
    rsx! {
        PublicLayout { title: "Tenant sign in".to_string(),
            article {
                header {
                    hgroup {
                        h2 { "Tenant Portal" }
                        p { "Your heat consumption and invoices" }
                    }
                }
                if expired {
                    p { class: "status-err", role: "alert", "Your session has expired. Please sign in again." }
                }
                if let Some(error) = error {
                    p { class: "status-err", role: "alert", "{error}" }
                }
                form { method: "post", action: "/tenant/login",
                    label { "Email"
                        input { name: "email", r#type: "email", value: "{email}", autocomplete: "username", required: true }
                    }
                    label { "Password"
                        input { name: "password", r#type: "password", autocomplete: "current-password", required: true }
                    }
                    button { r#type: "submit", "Sign in" }
                }
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TenantLoginQuery {
    pub expired: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TenantLoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// GET /tenant/login
pub async fn tenant_login_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<TenantLoginQuery>,
) -> Response {
    if let Some(token) = cookie_value(&headers, TENANT_COOKIE) {
        if state.tenant_sessions.validate(&token).await.is_ok() {
            return Redirect::to("/tenant").into_response();
        }
    }
    let expired = params.expired.is_some();
    render(rsx! {
        TenantLoginPage { email: String::new(), expired }
    })
    .into_response()
}

/// POST /tenant/login
pub async fn tenant_login_submit(
    State(state): State<AppState>,
    Form(form): Form<TenantLoginForm>,
) -> Response {
    let email = form.email.trim().to_string();
    match tenant_login(&state.api, &state.config.demo, &email, &form.password).await {
        Ok((login, demo)) => {
            let purged = state.tenant_sessions.purge_expired().await;
            if purged > 0 {
                debug!(purged, "dropped expired tenant sessions");
            }
            let (token, session) = state
                .tenant_sessions
                .create(&email, &login.token, login.expires_in, demo)
                .await;
            info!(email = %session.email, demo, "tenant session started");
            state.bus.publish(BusEvent::SessionStarted {
                username: session.email.clone(),
            });
            let max_age = (session.expires_at - session.issued_at).num_seconds();
            let cookie = session_cookie(TENANT_COOKIE, &token, max_age);
            ([(SET_COOKIE, cookie)], Redirect::to("/tenant")).into_response()
        }
        Err(message) => {
            warn!(email = %email, "tenant sign-in refused");
            let page = render(rsx! {
                TenantLoginPage { email, error: Some(message), expired: false }
            });
            (StatusCode::UNAUTHORIZED, page).into_response()
        }
    }
}

/// POST /tenant/logout
pub async fn tenant_logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    end_session(&state, &headers).await;
    (
        [(SET_COOKIE, clear_cookie(TENANT_COOKIE))],
        Redirect::to(TENANT_LOGIN_PATH),
    )
        .into_response()
}

async fn end_session(state: &AppState, headers: &HeaderMap) {
    let Some(token) = cookie_value(headers, TENANT_COOKIE) else {
        return;
    };
    if let Some(session) = state.tenant_sessions.revoke(&token).await {
        info!(email = %session.email, "tenant session ended");
        state.bus.publish(BusEvent::SessionEnded {
            username: session.email,
        });
    }
}

// =============================================================================
// Bearer-authenticated loads
// =============================================================================

/// The API no longer accepts the tenant's bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SessionRejected;

fn settle<T>(
    path: &str,
    result: Result<T, ApiError>,
    demo_fallback: bool,
    demo: impl FnOnce() -> T,
) -> Result<Loaded<T>, SessionRejected> {
    match result {
        Err(e) if e.is_unauthorized() => {
            warn!(path, error = %e, "tenant token rejected");
            Err(SessionRejected)
        }
        Err(e) => {
            warn!(path, error = %e, demo = demo_fallback, "tenant load failed");
            Ok(Loaded::resolve(Err(e), demo_fallback, demo))
        }
        ok => Ok(Loaded::resolve(ok, demo_fallback, demo)),
    }
}

async fn fetch_record<T: DeserializeOwned>(
    state: &AppState,
    session: &TenantSession,
    path: &str,
    demo: fn() -> T,
) -> Result<Loaded<T>, SessionRejected> {
    if session.demo {
        return Ok(Loaded::Demo(demo()));
    }
    let api = state.api.with_bearer(&session.bearer);
    settle(path, api.get_record(path).await, api.demo_fallback(), demo)
}

async fn fetch_list<T: DeserializeOwned>(
    state: &AppState,
    session: &TenantSession,
    path: &str,
    demo: fn() -> Vec<T>,
) -> Result<Loaded<Vec<T>>, SessionRejected> {
    if session.demo {
        return Ok(Loaded::Demo(demo()));
    }
    let api = state.api.with_bearer(&session.bearer);
    settle(path, api.get_list(path).await, api.demo_fallback(), demo)
}

/// Drop the session and send the tenant back to sign in
async fn rejected(state: &AppState, headers: &HeaderMap) -> Response {
    end_session(state, headers).await;
    (
        [(SET_COOKIE, clear_cookie(TENANT_COOKIE))],
        Redirect::to(&format!("{}?expired=1", TENANT_LOGIN_PATH)),
    )
        .into_response()
}

// =============================================================================
// Pages
// =============================================================================

fn profile_card(profile: &TenantProfile) -> Element {
    rsx! {
        article {
            header { strong { "{profile.name}" } }
            dl {
                dt { "Unit" }
                dd { {text(profile.unit.as_deref())} }
                dt { "Building" }
                dd { {text(profile.building.as_deref())} }
                dt { "Contract" }
                dd { {text(profile.contract_number.as_deref())} }
            }
        }
    }
}

fn latest_consumption(points: &[ConsumptionPoint]) -> Element {
    let Some(latest) = points.last() else {
        return rsx! { EmptyState { text: "No consumption recorded yet.".to_string() } };
    };
    rsx! {
        div { class: "stat-grid",
            StatCard {
                label: format!("Heat {}", latest.period),
                value: number(latest.heat_kwh, 0),
                hint: Some("kWh".to_string()),
            }
            StatCard {
                label: format!("Water {}", latest.period),
                value: number(latest.water_m3, 1),
                hint: Some("m³".to_string()),
            }
            StatCard {
                label: "Cost".to_string(),
                value: money(latest.cost, "EUR"),
            }
        }
    }
}

fn open_invoices(invoices: &[Invoice]) -> Element {
    let open: Vec<Invoice> = invoices.iter().filter(|inv| !inv.is_paid()).cloned().collect();
    if open.is_empty() {
        return rsx! { EmptyState { text: "No open invoices.".to_string() } };
    }
    invoice_table(&open)
}

#[component]
pub fn TenantHomePage(
    email: String,
    profile: Loaded<TenantProfile>,
    consumption: Loaded<Vec<ConsumptionPoint>>,
    invoices: Loaded<Vec<Invoice>>,
) -> Element {
    let profile = loaded_view(&profile, "/tenant", profile_card);
    let consumption = loaded_view(&consumption, "/tenant", |c| latest_consumption(c));
    let invoices = loaded_view(&invoices, "/tenant", |i| open_invoices(i));

    rsx! {
        TenantLayout {
            title: "Overview".to_string(),
            nav_active: "home".to_string(),
            email,

            h1 { "Overview" }
            {profile}
            h2 { "Latest consumption" }
            {consumption}
            h2 { "Open invoices" }
            {invoices}
        }
    }
}

/// GET /tenant
pub async fn tenant_home(
    State(state): State<AppState>,
    Extension(session): Extension<TenantSession>,
    headers: HeaderMap,
) -> Response {
    let (profile, consumption, invoices) = tokio::join!(
        fetch_record(&state, &session, PROFILE_PATH, demo::tenant_profile),
        fetch_list(&state, &session, CONSUMPTION_PATH, demo::tenant_consumption),
        fetch_list(&state, &session, INVOICES_PATH, demo::tenant_invoices),
    );
    let (Ok(profile), Ok(consumption), Ok(invoices)) = (profile, consumption, invoices) else {
        return rejected(&state, &headers).await;
    };
    render(rsx! {
        TenantHomePage { email: session.email.clone(), profile, consumption, invoices }
    })
    .into_response()
}

fn consumption_view(points: &[ConsumptionPoint]) -> Element {
    if points.is_empty() {
        return rsx! { EmptyState { text: "No consumption recorded yet.".to_string() } };
    }
    let svg = consumption_chart(points);
    let table = consumption_table(points);
    rsx! {
        Chart { svg }
        {table}
    }
}

#[component]
pub fn TenantConsumptionPage(email: String, consumption: Loaded<Vec<ConsumptionPoint>>) -> Element {
    let body = loaded_view(&consumption, "/tenant/consumption", |c| consumption_view(c));
    rsx! {
        TenantLayout {
            title: "Consumption".to_string(),
            nav_active: "consumption".to_string(),
            email,

            h1 { "Consumption" }
            {body}
        }
    }
}

/// GET /tenant/consumption
pub async fn tenant_consumption(
    State(state): State<AppState>,
    Extension(session): Extension<TenantSession>,
    headers: HeaderMap,
) -> Response {
    let Ok(consumption) =
        fetch_list(&state, &session, CONSUMPTION_PATH, demo::tenant_consumption).await
    else {
        return rejected(&state, &headers).await;
    };
    render(rsx! {
        TenantConsumptionPage { email: session.email.clone(), consumption }
    })
    .into_response()
}

#[component]
pub fn TenantInvoicesPage(email: String, invoices: Loaded<Vec<Invoice>>) -> Element {
    let body = loaded_view(&invoices, "/tenant/invoices", |i| invoice_table(i));
    rsx! {
        TenantLayout {
            title: "Invoices".to_string(),
            nav_active: "invoices".to_string(),
            email,

            h1 { "Invoices" }
            {body}
        }
    }
}

/// GET /tenant/invoices
pub async fn tenant_invoices(
    State(state): State<AppState>,
    Extension(session): Extension<TenantSession>,
    headers: HeaderMap,
) -> Response {
    let Ok(invoices) = fetch_list(&state, &session, INVOICES_PATH, demo::tenant_invoices).await
    else {
        return rejected(&state, &headers).await;
    };
    render(rsx! {
        TenantInvoicesPage { email: session.email.clone(), invoices }
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_rejects_session() {
        let err = ApiError::Status {
            status: 401,
            message: None,
        };
        let settled = settle::<Vec<Invoice>>("/api/tenant/invoices", Err(err), true, Vec::new);
        assert_eq!(settled, Err(SessionRejected));
    }

    #[test]
    fn other_failures_fall_back() {
        let err = ApiError::Status {
            status: 503,
            message: None,
        };
        let settled = settle("/api/tenant/invoices", Err(err), true, demo::tenant_invoices);
        assert!(matches!(settled, Ok(Loaded::Demo(_))));
    }

    #[test]
    fn home_lists_only_open_invoices() {
        let invoices = demo::tenant_invoices();
        let open = invoices.iter().filter(|i| !i.is_paid()).count();
        let html = dioxus::ssr::render_element(open_invoices(&invoices));
        assert_eq!(html.matches("<tbody").count(), usize::from(open > 0));
    }
}
