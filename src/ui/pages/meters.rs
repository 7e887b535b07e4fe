//! Meter list and meter detail with a readings chart.

use axum::extract::{Path, Query, State};
use axum::response::Html;
use axum::Extension;
use dioxus::prelude::*;
use serde::Deserialize;

use super::{is_selected, non_empty, Viewer};
use crate::api::AppState;
use crate::auth::Session;
use crate::charts::{line_chart, Series};
use crate::demo;
use crate::model::{Meter, MeterReading, Site};
use crate::records::filter_records;
use crate::ui::components::widgets::{count, number, text};
use crate::ui::components::{loaded_view, Chart, EmptyState, Layout};
use crate::ui::{filtered_path, render};
use crate::upstream::Loaded;

const METERS_PATH: &str = "/api/meters";
const SITES_PATH: &str = "/api/sites";

#[derive(Debug, Default, Deserialize)]
pub struct MetersQuery {
    pub site_id: Option<String>,
    pub q: Option<String>,
}

fn meter_table(meters: &[Meter]) -> Element {
    if meters.is_empty() {
        return rsx! { EmptyState { text: "No meters match the current filter.".to_string() } };
    }
    rsx! {
        table {
            thead {
                tr {
                    th { "Meter" } th { "Medium" } th { "Site" } th { "Gateway" }
                    th { "Address" } th { "Last value" } th { "Read at" }
                }
            }
            tbody {
                for meter in meters.iter() {
                    tr {
                        td { a { href: "/meters/{meter.id}", {meter.label()} } }
                        td { {text(meter.medium.as_deref())} }
                        td { {text(meter.site_id.as_ref().map(|id| id.as_str()))} }
                        td { {text(meter.gateway_id.as_ref().map(|id| id.as_str()))} }
                        td { {count(meter.primary_address)} }
                        td { {value_with_unit(meter.last_value, meter.unit.as_deref())} }
                        td { {text(meter.last_read_at.as_deref())} }
                    }
                }
            }
        }
    }
}

fn value_with_unit(value: Option<f64>, unit: Option<&str>) -> String {
    match (value, unit) {
        (Some(v), Some(unit)) => format!("{:.1} {}", v, unit),
        (value, _) => number(value, 1),
    }
}

/// Meters of `site_id` (when given) matching `query`
fn select_meters(meters: &[Meter], site_id: Option<&str>, query: &str) -> Vec<Meter> {
    let at_site: Vec<Meter> = match site_id {
        Some(site_id) => meters
            .iter()
            .filter(|m| m.site_id.as_ref().map_or(true, |id| id.as_str() == site_id))
            .cloned()
            .collect(),
        None => meters.to_vec(),
    };
    filter_records(&at_site, query)
}

#[component]
pub fn MetersPage(
    viewer: Viewer,
    meters: Loaded<Vec<Meter>>,
    sites: Vec<Site>,
    site_id: Option<String>,
    query: String,
) -> Element {
    let body = loaded_view(&meters, "/meters", |m| meter_table(m));

    rsx! {
        Layout {
            title: "Meters".to_string(),
            nav_active: "meters".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,

            h1 { "Meters" }
            form { method: "get", action: "/meters", class: "filters",
                select { name: "site_id",
                    option { value: "", selected: site_id.is_none(), "All sites" }
                    for site in sites.iter() {
                        option {
                            value: "{site.id}",
                            selected: is_selected(&site_id, site.id.as_str()),
                            "{site.name}"
                        }
                    }
                }
                input { r#type: "search", name: "q", value: "{query}", placeholder: "Serial, medium or status" }
                button { r#type: "submit", "Filter" }
            }
            {body}
        }
    }
}

/// GET /meters?site_id=&q=
pub async fn meters_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<MetersQuery>,
) -> Html<String> {
    let api = &state.api;
    let site_id = non_empty(&params.site_id).map(str::to_string);
    let meters_path = filtered_path(METERS_PATH, "site_id", site_id.as_deref());
    let (meters, sites) = tokio::join!(
        api.load_list(&meters_path, demo::meters),
        api.load_list(SITES_PATH, demo::sites),
    );
    let query = params.q.clone().unwrap_or_default();
    let meters = meters.map(|all| select_meters(&all, site_id.as_deref(), &query));
    let sites = sites.into_data().unwrap_or_default();

    render(rsx! {
        MetersPage { viewer: Viewer::from(&session), meters, sites, site_id, query }
    })
}

fn readings_chart(readings: &[MeterReading], unit: &str) -> String {
    let points: Vec<(String, f64)> = readings
        .iter()
        .filter_map(|r| {
            let label = r.timestamp.as_deref().unwrap_or_default();
            let label = label.get(..10).unwrap_or(label).to_string();
            r.value.map(|v| (label, v))
        })
        .collect();
    let labels: Vec<String> = points.iter().map(|(l, _)| l.clone()).collect();
    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    line_chart(&labels, &[Series::new(unit, values)])
}

fn readings_view(readings: &[MeterReading], unit: &str) -> Element {
    if readings.is_empty() {
        return rsx! { EmptyState { text: "No readings recorded for this meter.".to_string() } };
    }
    let svg = readings_chart(readings, unit);
    rsx! {
        Chart { svg }
        table {
            thead { tr { th { "Time" } th { "Value" } } }
            tbody {
                for reading in readings.iter().rev() {
                    tr {
                        td { {text(reading.timestamp.as_deref())} }
                        td { {value_with_unit(reading.value, reading.unit.as_deref().or(Some(unit)))} }
                    }
                }
            }
        }
    }
}

fn meter_summary(meter: &Meter) -> Element {
    rsx! {
        article {
            dl {
                dt { "Medium" }
                dd { {text(meter.medium.as_deref())} }
                dt { "Gateway / primary address" }
                dd {
                    {text(meter.gateway_id.as_ref().map(|id| id.as_str()))}
                    " / "
                    {count(meter.primary_address)}
                }
                dt { "Last value" }
                dd { {value_with_unit(meter.last_value, meter.unit.as_deref())} }
                dt { "Status" }
                dd { {text(meter.status.as_deref())} }
            }
        }
    }
}

#[component]
pub fn MeterDetailPage(
    viewer: Viewer,
    meter_id: String,
    meter: Loaded<Meter>,
    readings: Loaded<Vec<MeterReading>>,
) -> Element {
    let retry = format!("/meters/{}", meter_id);
    let title = meter
        .data()
        .map(Meter::label)
        .unwrap_or_else(|| meter_id.clone());
    let unit = meter
        .data()
        .and_then(|m| m.unit.clone())
        .unwrap_or_else(|| "kWh".to_string());
    let summary = loaded_view(&meter, &retry, meter_summary);
    let history = loaded_view(&readings, &retry, |r| readings_view(r, &unit));

    rsx! {
        Layout {
            title: format!("Meter {}", title),
            nav_active: "meters".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,

            p { a { href: "/meters", "← All meters" } }
            h1 { "Meter {title}" }
            {summary}
            h2 { "Readings" }
            {history}
        }
    }
}

/// GET /meters/{id}
pub async fn meter_detail_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(meter_id): Path<String>,
) -> Html<String> {
    let api = &state.api;
    let meter_path = format!("{}/{}", METERS_PATH, urlencoding::encode(&meter_id));
    let readings_path = format!("{}/readings", meter_path);
    let (meter, readings) = tokio::join!(
        api.load_record(&meter_path, || demo::meter(&meter_id)),
        api.load_list(&readings_path, || demo::meter_readings(&meter_id)),
    );

    render(rsx! {
        MeterDetailPage { viewer: Viewer::from(&session), meter_id, meter, readings }
    })
}
