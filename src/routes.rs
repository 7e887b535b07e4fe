//! HTTP routing
//!
//! Three groups share one state:
//! - console pages and their script endpoints, behind the operator session gate
//! - tenant portal pages, behind the tenant session gate
//! - public sign-in pages and the health status

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::api::{self, AppState};
use crate::auth::{require_session, require_tenant};
use crate::ui::pages::{
    analytics, billing, dashboard, gateways, goals, login, maintenance, manual_entry, meters,
    reader, remote, sites, tenant,
};

fn console_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard_page))
        // Network inventory
        .route("/sites", get(sites::sites_page))
        .route("/sites/{id}", get(sites::site_detail_page))
        .route("/buildings", get(sites::buildings_page))
        .route("/meters", get(meters::meters_page))
        .route("/meters/{id}", get(meters::meter_detail_page))
        // M-Bus
        .route(
            "/gateways",
            get(gateways::gateways_page).post(gateways::create_gateway),
        )
        .route("/gateways/{id}/delete", post(gateways::delete_gateway))
        .route("/mbus/reader", get(reader::reader_page))
        .route("/mbus/reader/{gateway}/state", get(api::reader_state_handler))
        .route("/mbus/reader/{gateway}/connect", post(api::reader_connect_handler))
        .route("/mbus/reader/{gateway}/start", post(api::reader_start_handler))
        .route("/mbus/reader/{gateway}/stop", post(api::reader_stop_handler))
        .route(
            "/mbus/reader/{gateway}/disconnect",
            post(api::reader_disconnect_handler),
        )
        .route("/mbus/remote", get(remote::remote_page))
        .route("/mbus/remote/{gateway}/status", get(api::remote_status_handler))
        .route("/mbus/remote/{gateway}/command", post(remote::remote_command))
        // Operations
        .route(
            "/maintenance",
            get(maintenance::maintenance_page).post(maintenance::create_task),
        )
        .route("/maintenance/{id}/delete", post(maintenance::delete_task))
        .route("/goals", get(goals::goals_page).post(goals::create_goal))
        .route("/goals/{id}/delete", post(goals::delete_goal))
        .route(
            "/manual-entry",
            get(manual_entry::manual_entry_page).post(manual_entry::submit_manual_entry),
        )
        // Reports
        .route("/billing", get(billing::billing_page))
        .route("/finance", get(billing::finance_page))
        .route("/analytics", get(analytics::analytics_page))
        .route("/carbon", get(analytics::carbon_page))
        // Event stream (SSE)
        .route("/events", get(api::events_handler))
        .route("/logout", post(login::logout))
        .route_layer(from_fn_with_state(state.clone(), require_session))
}

fn tenant_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/tenant", get(tenant::tenant_home))
        .route("/tenant/consumption", get(tenant::tenant_consumption))
        .route("/tenant/invoices", get(tenant::tenant_invoices))
        .route("/tenant/logout", post(tenant::tenant_logout))
        .route_layer(from_fn_with_state(state.clone(), require_tenant))
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api::status_handler))
        .route("/login", get(login::login_page).post(login::login_submit))
        .route(
            "/tenant/login",
            get(tenant::tenant_login_page).post(tenant::tenant_login_submit),
        )
}

/// The full application router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(console_routes(&state))
        .merge(tenant_routes(&state))
        .merge(public_routes())
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
