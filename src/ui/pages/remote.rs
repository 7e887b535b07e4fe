//! Remote control of a gateway: status panel plus command form.

use axum::extract::{Path, Query, State};
use axum::response::Html;
use axum::{Extension, Form};
use dioxus::prelude::*;
use serde::Deserialize;
use tracing::{info, warn};

use super::gateways::GATEWAYS_PATH;
use super::{is_selected, non_empty, Viewer};
use crate::api::{load_remote_status, AppState};
use crate::auth::Session;
use crate::demo;
use crate::model::gateway::BAUD_RATES;
use crate::model::{Gateway, RemoteAction, RemoteCommand, RemoteCommandForm, RemoteStatus};
use crate::ui::components::widgets::{count, text};
use crate::ui::components::{loaded_view, EmptyState, Layout, Notice};
use crate::ui::render;
use crate::upstream::Loaded;

const REMOTE_SCRIPT: &str = r#"
(function(){
    const root = document.getElementById('remote');
    if (!root || !root.dataset.gateway) return;
    const url = '/mbus/remote/' + encodeURIComponent(root.dataset.gateway) + '/status';
    const set = (id, v) => { const el = document.getElementById(id); if (el) el.textContent = v ?? '-'; };
    async function poll() {
        try {
            const res = await fetch(url, { headers: { 'Accept': 'application/json' } });
            if (!res.ok) return;
            const body = await res.json();
            const s = body.status || {};
            set('remote-state', s.state);
            set('remote-baud', s.baud_rate);
            set('remote-last-command', s.last_command);
            set('remote-last-response', s.last_response);
            set('remote-updated', s.updated_at);
        } catch (e) {
            console.warn('remote status poll failed', e);
        }
    }
    const timer = setInterval(poll, Number(root.dataset.interval) || 10000);
    window.addEventListener('pagehide', () => clearInterval(timer));
})();
"#;

fn command_path(gateway: &str) -> String {
    format!("/api/mbus/remote/{}/command", urlencoding::encode(gateway))
}

fn status_panel(status: &RemoteStatus) -> Element {
    rsx! {
        article {
            dl {
                dt { "State" }
                dd { strong { id: "remote-state", {text(status.state.as_deref())} } }
                dt { "Baud rate" }
                dd { id: "remote-baud", {count(status.baud_rate)} }
                dt { "Last command" }
                dd { id: "remote-last-command", {text(status.last_command.as_deref())} }
                dt { "Last response" }
                dd { code { id: "remote-last-response", {text(status.last_response.as_deref())} } }
                dt { "Updated" }
                dd { id: "remote-updated", {text(status.updated_at.as_deref())} }
            }
        }
    }
}

fn command_form(gateway: &str) -> Element {
    let action = format!("/mbus/remote/{}/command", urlencoding::encode(gateway));
    rsx! {
        article {
            header { strong { "Send command" } }
            form { method: "post", action: "{action}",
                label { "Command"
                    select { name: "command",
                        for cmd in RemoteAction::ALL.iter() {
                            option { value: cmd.as_str(), {cmd.label()} }
                        }
                    }
                }
                div { class: "grid",
                    label { "Primary address"
                        input { name: "address", r#type: "number", min: "0", max: "250", placeholder: "read_meter only" }
                    }
                    label { "Baud rate"
                        select { name: "baud_rate",
                            for baud in BAUD_RATES.iter() {
                                option { value: "{baud}", selected: *baud == 2400, "{baud}" }
                            }
                        }
                    }
                }
                button { r#type: "submit", "Send" }
            }
        }
    }
}

#[component]
pub fn RemotePage(
    viewer: Viewer,
    gateways: Loaded<Vec<Gateway>>,
    selected: Option<String>,
    status: Option<Loaded<RemoteStatus>>,
    interval_ms: u64,
    notice: Option<Notice>,
) -> Element {
    let choices: Vec<Gateway> = gateways.data().cloned().unwrap_or_default();
    let body = match (&selected, &status) {
        (Some(gateway), Some(status)) => {
            let retry = format!("/mbus/remote?gateway={}", urlencoding::encode(gateway));
            let panel = loaded_view(status, &retry, status_panel);
            let form = command_form(gateway);
            rsx! {
                section {
                    id: "remote",
                    "data-gateway": "{gateway}",
                    "data-interval": "{interval_ms}",
                    {panel}
                    {form}
                }
            }
        }
        _ => rsx! {
            EmptyState { text: "Select a gateway to control it remotely.".to_string() }
        },
    };

    rsx! {
        Layout {
            title: "Remote Control".to_string(),
            nav_active: "remote".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,
            notice,
            scripts: Some(REMOTE_SCRIPT.to_string()),

            hgroup {
                h1 { "Remote Control" }
                p { "Gateway status and maintenance commands" }
            }
            form { method: "get", action: "/mbus/remote", class: "filters",
                select { name: "gateway",
                    for gw in choices.iter() {
                        option {
                            value: "{gw.id}",
                            selected: is_selected(&selected, gw.id.as_str()),
                            "{gw.name}"
                        }
                    }
                }
                button { r#type: "submit", class: "secondary", "Select" }
            }
            {body}
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoteQuery {
    pub gateway: Option<String>,
}

async fn remote_view(
    state: &AppState,
    session: &Session,
    gateway: Option<String>,
    notice: Option<Notice>,
) -> Html<String> {
    let gateways = state.api.load_list(GATEWAYS_PATH, demo::gateways).await;
    let selected = gateway.or_else(|| {
        gateways
            .data()
            .and_then(|list| list.first())
            .map(|gw| gw.id.to_string())
    });
    let status = match &selected {
        Some(gateway) => Some(load_remote_status(&state.api, gateway).await),
        None => None,
    };
    let interval_ms = state.config.polling.remote_interval().as_millis() as u64;

    render(rsx! {
        RemotePage {
            viewer: Viewer::from(session),
            gateways,
            selected,
            status,
            interval_ms,
            notice,
        }
    })
}

/// GET /mbus/remote?gateway=
pub async fn remote_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<RemoteQuery>,
) -> Html<String> {
    let gateway = non_empty(&params.gateway).map(str::to_string);
    remote_view(&state, &session, gateway, None).await
}

/// POST /mbus/remote/{gateway}/command
pub async fn remote_command(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(gateway): Path<String>,
    Form(form): Form<RemoteCommandForm>,
) -> Html<String> {
    let notice = match RemoteCommand::try_from(form) {
        Err(e) => Notice::error(e.to_string()),
        Ok(command) => match state.api.post(&command_path(&gateway), &command).await {
            Ok(_) => {
                info!(gateway_id = %gateway, command = command.command.as_str(), "remote command sent");
                Notice::success(format!("{} sent to {}", command.command.label(), gateway))
            }
            Err(e) => {
                warn!(gateway_id = %gateway, error = %e, "remote command failed");
                Notice::error(e.user_message())
            }
        },
    };
    remote_view(&state, &session, Some(gateway), Some(notice)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_path_encodes_gateway() {
        assert_eq!(command_path("gw 1"), "/api/mbus/remote/gw%201/command");
    }

    #[test]
    fn no_selection_asks_for_gateway() {
        let html = dioxus::ssr::render_element(rsx! {
            RemotePage {
                viewer: Viewer { username: "ops".to_string(), demo: false },
                gateways: Loaded::Demo(demo::gateways()),
                interval_ms: 10_000,
            }
        });
        assert!(html.contains("Select a gateway"));
        assert!(!html.contains("id=\"remote\""));
    }

    #[test]
    fn command_form_lists_every_action() {
        let html = dioxus::ssr::render_element(command_form("gw-1"));
        for action in RemoteAction::ALL.iter() {
            assert!(html.contains(action.as_str()));
        }
        assert!(html.contains("/mbus/remote/gw-1/command"));
    }
}
