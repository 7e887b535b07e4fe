//! Live M-Bus reader page.
//!
//! The buttons post to the reader endpoints in `api`; while the session is
//! reading, the page script polls the snapshot and redraws the table. The
//! poll interval is cleared when the reader leaves the reading state and
//! when the page is hidden.

use axum::extract::{Query, State};
use axum::response::Html;
use axum::Extension;
use dioxus::prelude::*;
use serde::Deserialize;

use super::gateways::GATEWAYS_PATH;
use super::{is_selected, non_empty, Viewer};
use crate::api::AppState;
use crate::auth::Session;
use crate::demo;
use crate::model::Gateway;
use crate::pollers::{FeedMode, ReaderAction, ReaderSnapshot};
use crate::ui::components::widgets::{number, text};
use crate::ui::components::{EmptyState, Layout, Notice};
use crate::ui::render;
use crate::upstream::Loaded;

const READER_SCRIPT: &str = r#"
(function(){
    const root = document.getElementById('reader');
    if (!root || !root.dataset.gateway) return;
    const url = '/mbus/reader/' + encodeURIComponent(root.dataset.gateway) + '/state';
    let timer = null;
    const stop = () => { if (timer) { clearInterval(timer); timer = null; } };

    function draw(s) {
        document.getElementById('reader-state').textContent = s.state;
        document.getElementById('reader-polls').textContent = s.polls;
        document.getElementById('reader-error').textContent = s.last_error || '';
        document.getElementById('readings').innerHTML = (s.readings || []).map(r =>
            '<tr><td><code>' + esc(r.meter_id) + '</code></td><td>' + esc(r.timestamp || '-') +
            '</td><td>' + fmt(r.value, 1) + ' ' + esc(r.unit || '') + '</td></tr>'
        ).join('');
    }

    async function poll() {
        try {
            const res = await fetch(url, { headers: { 'Accept': 'application/json' } });
            if (!res.ok) { stop(); return; }
            const s = await res.json();
            draw(s);
            if (s.state !== 'reading') stop();
        } catch (e) {
            console.warn('reader poll failed', e);
        }
    }

    if (root.dataset.state === 'reading') {
        timer = setInterval(poll, Number(root.dataset.interval) || 5000);
    }
    document.querySelectorAll('form[data-halts="true"]').forEach(f => f.addEventListener('submit', stop));
    window.addEventListener('pagehide', stop);
})();
"#;

/// (action, path segment, label, halts polling)
const ACTIONS: [(ReaderAction, &str, &str, bool); 4] = [
    (ReaderAction::Connect, "connect", "Connect", false),
    (ReaderAction::Start, "start", "Start reading", false),
    (ReaderAction::Stop, "stop", "Stop", true),
    (ReaderAction::Disconnect, "disconnect", "Disconnect", true),
];

fn halts_flag(halts: bool) -> &'static str {
    if halts {
        "true"
    } else {
        "false"
    }
}

fn mode_label(mode: Option<FeedMode>) -> &'static str {
    match mode {
        Some(FeedMode::Live) => "Live gateway feed",
        Some(FeedMode::Simulated) => "Simulated readings (gateway not connected)",
        None => "-",
    }
}

fn reader_panel(snapshot: &ReaderSnapshot, interval_ms: u64) -> Element {
    let gateway = snapshot.gateway_id.clone();
    let base = format!("/mbus/reader/{}", urlencoding::encode(&gateway));
    let state = snapshot.state.as_str();
    let mode = mode_label(snapshot.mode);
    let polls = snapshot.polls;
    let last_error = snapshot.last_error.clone().unwrap_or_default();
    let updated = snapshot
        .updated_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    rsx! {
        section {
            id: "reader",
            "data-gateway": "{gateway}",
            "data-state": "{state}",
            "data-interval": "{interval_ms}",
            article {
                dl {
                    dt { "State" }
                    dd { strong { id: "reader-state", "{state}" } }
                    dt { "Source" }
                    dd { "{mode}" }
                    dt { "Polls" }
                    dd { span { id: "reader-polls", "{polls}" } small { " last update {updated}" } }
                }
                p { id: "reader-error", class: "status-err", "{last_error}" }
                div { class: "controls",
                    for (action, segment, label, halts) in ACTIONS.iter() {
                        form {
                            method: "post",
                            action: "{base}/{segment}",
                            "data-halts": halts_flag(*halts),
                            button {
                                r#type: "submit",
                                disabled: snapshot.state.apply(*action).is_err(),
                                "{label}"
                            }
                        }
                    }
                }
            }
            table {
                thead { tr { th { "Meter" } th { "Time" } th { "Value" } } }
                tbody { id: "readings",
                    for reading in snapshot.readings.iter() {
                        tr {
                            td { code { "{reading.meter_id}" } }
                            td { {text(reading.timestamp.as_deref())} }
                            td {
                                {number(reading.value, 1)}
                                " "
                                {reading.unit.clone().unwrap_or_default()}
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
pub fn ReaderPage(
    viewer: Viewer,
    gateways: Loaded<Vec<Gateway>>,
    selected: Option<String>,
    snapshot: Option<ReaderSnapshot>,
    interval_ms: u64,
    notice: Option<Notice>,
) -> Element {
    let choices: Vec<Gateway> = gateways.data().cloned().unwrap_or_default();
    let panel = match &snapshot {
        Some(snapshot) => reader_panel(snapshot, interval_ms),
        None => rsx! {
            EmptyState { text: "Select a gateway to start a live reading session.".to_string() }
        },
    };

    rsx! {
        Layout {
            title: "Live Reader".to_string(),
            nav_active: "reader".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,
            notice,
            scripts: Some(READER_SCRIPT.to_string()),

            hgroup {
                h1 { "Live M-Bus Reader" }
                p { "Connect to a gateway and stream meter readings" }
            }
            if gateways.is_demo() {
                p { mark { "Demo data" } " Gateway list from sample data." }
            }
            form { method: "get", action: "/mbus/reader", class: "filters",
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
            {panel}
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReaderQuery {
    pub gateway: Option<String>,
    pub error: Option<String>,
}

/// GET /mbus/reader?gateway=&error=
pub async fn reader_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<ReaderQuery>,
) -> Html<String> {
    let gateways = state.api.load_list(GATEWAYS_PATH, demo::gateways).await;
    let selected = non_empty(&params.gateway).map(str::to_string).or_else(|| {
        gateways
            .data()
            .and_then(|list| list.first())
            .map(|gw| gw.id.to_string())
    });
    let snapshot = match &selected {
        Some(gateway) => Some(state.readers.snapshot(gateway).await),
        None => None,
    };
    let interval_ms = state.config.polling.reader_interval().as_millis() as u64;
    let notice = non_empty(&params.error).map(Notice::error);

    render(rsx! {
        ReaderPage {
            viewer: Viewer::from(&session),
            gateways,
            selected,
            snapshot,
            interval_ms,
            notice,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pollers::ReaderState;

    fn snapshot(state: ReaderState) -> ReaderSnapshot {
        ReaderSnapshot {
            gateway_id: "gw-1".to_string(),
            state,
            mode: Some(FeedMode::Simulated),
            readings: Vec::new(),
            polls: 4,
            last_error: None,
            updated_at: None,
        }
    }

    #[test]
    fn panel_exposes_state_for_the_script() {
        let html = dioxus::ssr::render_element(reader_panel(&snapshot(ReaderState::Reading), 5000));
        assert!(html.contains("data-state=\"reading\""));
        assert!(html.contains("data-interval=\"5000\""));
        assert!(html.contains("/mbus/reader/gw-1/stop"));
        assert!(html.contains("Simulated readings"));
    }

    #[test]
    fn stop_and_disconnect_halt_polling() {
        assert_eq!(halts_flag(true), "true");
        let halting: Vec<&str> = ACTIONS
            .iter()
            .filter(|(_, _, _, halts)| *halts)
            .map(|(_, segment, _, _)| *segment)
            .collect();
        assert_eq!(halting, ["stop", "disconnect"]);
    }
}
