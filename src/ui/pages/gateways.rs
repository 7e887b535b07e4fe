//! Gateway management: register, remove, and watch connection status.
//!
//! Status cells update live from `GatewayStatusChanged` events on `/events`.

use axum::extract::{Path, State};
use axum::response::Html;
use axum::{Extension, Form};
use dioxus::prelude::*;

use super::Viewer;
use crate::api::AppState;
use crate::auth::Session;
use crate::demo;
use crate::model::gateway::DEFAULT_GATEWAY_PORT;
use crate::model::{Gateway, GatewayForm, RecordId};
use crate::ui::components::widgets::text;
use crate::ui::components::{loaded_view, EmptyState, Layout, Notice};
use crate::ui::{create_record, delete_record, render};
use crate::upstream::Loaded;

pub(crate) const GATEWAYS_PATH: &str = "/api/mbus/gateways";

const GATEWAYS_SCRIPT: &str = r#"
(function(){
    const es = new EventSource('/events');
    es.onmessage = (e) => {
        try {
            const event = JSON.parse(e.data);
            if (event.type !== 'GatewayStatusChanged') return;
            const p = event.payload;
            const row = document.querySelector(`tr[data-gateway-id="${CSS.escape(p.gateway_id)}"]`);
            if (!row) return;
            const cell = row.querySelector('.gw-status');
            cell.textContent = p.online ? 'Online' : 'Offline';
            cell.className = 'gw-status ' + (p.online ? 'status-ok' : 'status-err');
        } catch (err) { console.error('SSE parse error:', err); }
    };
    window.addEventListener('pagehide', () => es.close());
})();
"#;

fn status_cell_class(online: bool) -> &'static str {
    if online {
        "gw-status status-ok"
    } else {
        "gw-status status-err"
    }
}

fn gateway_rows(gateways: &[Gateway]) -> Element {
    if gateways.is_empty() {
        return rsx! { EmptyState { text: "No gateways registered yet. Add one below.".to_string() } };
    }
    rsx! {
        table {
            thead {
                tr {
                    th { "Name" } th { "Endpoint" } th { "Site" } th { "Firmware" }
                    th { "Status" } th { "Last seen" } th {}
                }
            }
            tbody {
                for gw in gateways.iter() {
                    tr { "data-gateway-id": "{gw.id}",
                        td { "{gw.name}" }
                        td { code { {gw.endpoint()} } }
                        td { {text(gw.site_id.as_ref().map(|id| id.as_str()))} }
                        td { {text(gw.firmware.as_deref())} }
                        td { class: status_cell_class(gw.is_online()),
                            if gw.is_online() { "Online" } else { "Offline" }
                        }
                        td { {text(gw.last_seen.as_deref())} }
                        td {
                            div { class: "controls",
                                a { href: "/mbus/reader?gateway={gw.id}", "Reader" }
                                a { href: "/mbus/remote?gateway={gw.id}", "Remote" }
                                form {
                                    method: "post",
                                    action: "/gateways/{gw.id}/delete",
                                    class: "inline-form",
                                    button { r#type: "submit", class: "secondary outline", "Delete" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
pub fn GatewaysPage(
    viewer: Viewer,
    gateways: Loaded<Vec<Gateway>>,
    notice: Option<Notice>,
    last_poll: Option<String>,
) -> Element {
    let list = loaded_view(&gateways, "/gateways", |g| gateway_rows(g));
    let default_port = DEFAULT_GATEWAY_PORT.to_string();

    rsx! {
        Layout {
            title: "Gateways".to_string(),
            nav_active: "gateways".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,
            notice,
            scripts: Some(GATEWAYS_SCRIPT.to_string()),

            hgroup {
                h1 { "Gateways" }
                if let Some(last_poll) = last_poll {
                    p { "Status monitor last polled {last_poll}" }
                } else {
                    p { "Status monitor has not polled yet" }
                }
            }
            {list}
            details {
                summary { role: "button", class: "secondary", "Register gateway" }
                form { method: "post", action: "/gateways",
                    div { class: "grid",
                        label { "Name"
                            input { name: "name", required: true, placeholder: "Nordhafen Block A" }
                        }
                        label { "Host"
                            input { name: "host", required: true, placeholder: "10.20.1.15" }
                        }
                        label { "Port"
                            input { name: "port", r#type: "number", min: "1", max: "65535", placeholder: "{default_port}" }
                        }
                        label { "Site ID"
                            input { name: "site_id", placeholder: "optional" }
                        }
                    }
                    button { r#type: "submit", "Add gateway" }
                }
            }
        }
    }
}

async fn last_poll(state: &AppState) -> Option<String> {
    state
        .gateways
        .snapshot()
        .await
        .last_poll
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// GET /gateways
pub async fn gateways_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Html<String> {
    let gateways = state.api.load_list(GATEWAYS_PATH, demo::gateways).await;
    let last_poll = last_poll(&state).await;
    render(rsx! {
        GatewaysPage { viewer: Viewer::from(&session), gateways, last_poll }
    })
}

/// POST /gateways
pub async fn create_gateway(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<GatewayForm>,
) -> Html<String> {
    let loaded = state.api.load_list(GATEWAYS_PATH, demo::gateways).await;
    let (gateways, notice) =
        create_record::<Gateway, _>(&state, GATEWAYS_PATH, "Gateway", loaded, form).await;
    let last_poll = last_poll(&state).await;
    render(rsx! {
        GatewaysPage { viewer: Viewer::from(&session), gateways, notice: Some(notice), last_poll }
    })
}

/// POST /gateways/{id}/delete
pub async fn delete_gateway(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Html<String> {
    let loaded = state.api.load_list(GATEWAYS_PATH, demo::gateways).await;
    let (gateways, notice) =
        delete_record(&state, GATEWAYS_PATH, "Gateway", loaded, RecordId::from(id)).await;
    let last_poll = last_poll(&state).await;
    render(rsx! {
        GatewaysPage { viewer: Viewer::from(&session), gateways, notice: Some(notice), last_poll }
    })
}
