//! Shared state and JSON endpoints
//!
//! HTML pages live in `ui`; this module holds the pieces scripts talk to:
//! health status, the SSE event stream, and live reader / remote snapshots.

use axum::{
    extract::{Path, State},
    http::{header::ACCEPT, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Redirect, Response,
    },
    Json,
};
use futures::stream::Stream;
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::auth::{ConsoleSessions, TenantSessions};
use crate::bus::SharedBus;
use crate::config::Config;
use crate::demo;
use crate::model::RemoteStatus;
use crate::pollers::{
    GatewayMonitor, LiveReaderRegistry, MonitorSnapshot, ReaderAction, ReaderError,
    ReaderSnapshot,
};
use crate::upstream::{ApiClient, Loaded};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: ApiClient,
    pub sessions: ConsoleSessions,
    pub tenant_sessions: TenantSessions,
    pub readers: LiveReaderRegistry,
    pub gateways: GatewayMonitor,
    pub bus: SharedBus,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, bus: SharedBus) -> anyhow::Result<Self> {
        let api = ApiClient::new(&config.api)?.with_demo_fallback(config.demo.fallback);
        let readers =
            LiveReaderRegistry::new(api.clone(), bus.clone(), config.polling.reader_interval());
        let gateways =
            GatewayMonitor::new(api.clone(), bus.clone(), config.polling.gateway_interval());
        Ok(Self {
            sessions: ConsoleSessions::new(config.session.ttl_secs),
            tenant_sessions: TenantSessions::new(config.session.tenant_ttl_secs),
            config: Arc::new(config),
            api,
            readers,
            gateways,
            bus,
            started_at: Instant::now(),
        })
    }
}

/// General status response
#[derive(Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub git_sha: &'static str,
    pub uptime_secs: u64,
    pub demo_fallback: bool,
    pub gateways: MonitorSnapshot,
    pub active_readers: Vec<String>,
    pub bus_subscribers: usize,
}

/// GET /status - health and poller status
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        service: "heatnet-console",
        version: env!("HNC_VERSION"),
        git_sha: env!("HNC_GIT_SHA"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        demo_fallback: state.config.demo.fallback,
        gateways: state.gateways.snapshot().await,
        active_readers: state.readers.reading().await,
        bus_subscribers: state.bus.subscriber_count(),
    })
}

/// GET /events - SSE stream of bus events
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.bus.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default().data(json))),
            Err(_) => None,
        },
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

// =============================================================================
// Live M-Bus reader
// =============================================================================

/// GET /mbus/reader/{gateway}/state
pub async fn reader_state_handler(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
) -> Json<ReaderSnapshot> {
    Json(state.readers.snapshot(&gateway).await)
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

async fn reader_action(
    state: AppState,
    gateway: String,
    headers: HeaderMap,
    action: ReaderAction,
) -> Response {
    let result = match action {
        ReaderAction::Connect => state.readers.connect(&gateway).await,
        ReaderAction::Start => state.readers.start(&gateway).await,
        ReaderAction::Stop => state.readers.stop(&gateway).await,
        _ => state.readers.disconnect(&gateway).await,
    };

    if wants_json(&headers) {
        return match result {
            Ok(snapshot) => Json(snapshot).into_response(),
            Err(e) => {
                let status = match e {
                    ReaderError::Transition(_) => StatusCode::CONFLICT,
                    ReaderError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, Json(json!({ "error": e.to_string() }))).into_response()
            }
        };
    }

    let mut target = format!("/mbus/reader?gateway={}", urlencoding::encode(&gateway));
    if let Err(e) = result {
        target.push_str("&error=");
        target.push_str(&urlencoding::encode(&e.to_string()));
    }
    Redirect::to(&target).into_response()
}

/// POST /mbus/reader/{gateway}/connect
pub async fn reader_connect_handler(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
    headers: HeaderMap,
) -> Response {
    reader_action(state, gateway, headers, ReaderAction::Connect).await
}

/// POST /mbus/reader/{gateway}/start
pub async fn reader_start_handler(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
    headers: HeaderMap,
) -> Response {
    reader_action(state, gateway, headers, ReaderAction::Start).await
}

/// POST /mbus/reader/{gateway}/stop
pub async fn reader_stop_handler(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
    headers: HeaderMap,
) -> Response {
    reader_action(state, gateway, headers, ReaderAction::Stop).await
}

/// POST /mbus/reader/{gateway}/disconnect
pub async fn reader_disconnect_handler(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
    headers: HeaderMap,
) -> Response {
    reader_action(state, gateway, headers, ReaderAction::Disconnect).await
}

// =============================================================================
// Remote control
// =============================================================================

#[derive(Serialize)]
pub struct RemoteStatusResponse {
    pub demo: bool,
    pub status: RemoteStatus,
}

pub fn remote_status_path(gateway: &str) -> String {
    format!("/api/mbus/remote/{}/status", urlencoding::encode(gateway))
}

pub async fn load_remote_status(api: &ApiClient, gateway: &str) -> Loaded<RemoteStatus> {
    api.load_record(&remote_status_path(gateway), || demo::remote_status(gateway))
        .await
}

/// GET /mbus/remote/{gateway}/status
pub async fn remote_status_handler(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
) -> Response {
    match load_remote_status(&state.api, &gateway).await {
        Loaded::Live(status) => Json(RemoteStatusResponse {
            demo: false,
            status,
        })
        .into_response(),
        Loaded::Demo(status) => Json(RemoteStatusResponse { demo: true, status }).into_response(),
        Loaded::Failed(message) => {
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": message }))).into_response()
        }
    }
}
