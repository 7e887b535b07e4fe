//! Manual meter reading entry for meters that are not on the bus.

use axum::extract::State;
use axum::response::Html;
use axum::{Extension, Form};
use dioxus::prelude::*;

use super::Viewer;
use crate::api::AppState;
use crate::auth::Session;
use crate::demo;
use crate::model::{ManualEntry, ManualEntryForm, Meter};
use crate::ui::components::widgets::{number, text};
use crate::ui::components::{loaded_view, EmptyState, Layout, Notice};
use crate::ui::{create_record, render};
use crate::upstream::Loaded;

const ENTRIES_PATH: &str = "/api/readings/manual";
const METERS_PATH: &str = "/api/meters";
const RECENT_LIMIT: usize = 20;

/// Newest first, capped at [`RECENT_LIMIT`]
fn recent(entries: &[ManualEntry]) -> Vec<ManualEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.read_at.cmp(&a.read_at));
    sorted.truncate(RECENT_LIMIT);
    sorted
}

fn entry_table(entries: &[ManualEntry]) -> Element {
    if entries.is_empty() {
        return rsx! { EmptyState { text: "No manual readings entered yet.".to_string() } };
    }
    let rows = recent(entries);
    rsx! {
        table {
            thead { tr { th { "Date" } th { "Meter" } th { "Value" } th { "Note" } } }
            tbody {
                for entry in rows.iter() {
                    tr {
                        td { {text(entry.read_at.as_deref())} }
                        td { a { href: "/meters/{entry.meter_id}", code { "{entry.meter_id}" } } }
                        td {
                            {number(entry.value, 2)}
                            " "
                            {entry.unit.clone().unwrap_or_default()}
                        }
                        td { {text(entry.note.as_deref())} }
                    }
                }
            }
        }
    }
}

#[component]
pub fn ManualEntryPage(
    viewer: Viewer,
    entries: Loaded<Vec<ManualEntry>>,
    meters: Vec<Meter>,
    notice: Option<Notice>,
) -> Element {
    let list = loaded_view(&entries, "/manual-entry", |e| entry_table(e));

    rsx! {
        Layout {
            title: "Manual Entry".to_string(),
            nav_active: "manual-entry".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,
            notice,

            h1 { "Manual Reading Entry" }
            article {
                form { method: "post", action: "/manual-entry",
                    div { class: "grid",
                        label { "Meter"
                            select { name: "meter_id", required: true,
                                option { value: "", "Select a meter" }
                                for meter in meters.iter() {
                                    option { value: "{meter.id}", {meter.label()} }
                                }
                            }
                        }
                        label { "Value"
                            input { name: "value", required: true }
                        }
                        label { "Unit"
                            input { name: "unit", placeholder: "kWh" }
                        }
                        label { "Date"
                            input { name: "read_at", r#type: "date" }
                        }
                    }
                    label { "Note"
                        input { name: "note", placeholder: "optional" }
                    }
                    button { r#type: "submit", "Save reading" }
                }
            }
            h2 { "Recent entries" }
            {list}
        }
    }
}

async fn load_page_data(state: &AppState) -> (Loaded<Vec<ManualEntry>>, Vec<Meter>) {
    let api = &state.api;
    let (entries, meters) = tokio::join!(
        api.load_list(ENTRIES_PATH, demo::manual_entries),
        api.load_list(METERS_PATH, demo::meters),
    );
    (entries, meters.into_data().unwrap_or_default())
}

/// GET /manual-entry
pub async fn manual_entry_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Html<String> {
    let (entries, meters) = load_page_data(&state).await;
    render(rsx! {
        ManualEntryPage { viewer: Viewer::from(&session), entries, meters }
    })
}

/// POST /manual-entry
pub async fn submit_manual_entry(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<ManualEntryForm>,
) -> Html<String> {
    let (loaded, meters) = load_page_data(&state).await;
    let (entries, notice) =
        create_record::<ManualEntry, _>(&state, ENTRIES_PATH, "Reading", loaded, form).await;
    render(rsx! {
        ManualEntryPage { viewer: Viewer::from(&session), entries, meters, notice: Some(notice) }
    })
}
