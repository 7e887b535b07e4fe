//! Consumption analytics and carbon reporting.

use axum::extract::{Query, State};
use axum::response::Html;
use axum::Extension;
use dioxus::prelude::*;
use serde::Deserialize;

use super::{is_selected, non_empty, Viewer};
use crate::api::AppState;
use crate::auth::Session;
use crate::charts::{bar_chart, line_chart, pie_chart, Series};
use crate::demo;
use crate::model::{CarbonReport, ConsumptionPoint};
use crate::ui::components::widgets::{money, number};
use crate::ui::components::{loaded_view, Chart, EmptyState, Layout, StatCard};
use crate::ui::{filtered_path, render};
use crate::upstream::Loaded;

const CONSUMPTION_PATH: &str = "/api/analytics/consumption";
const CARBON_PATH: &str = "/api/analytics/carbon";
const SITES_PATH: &str = "/api/sites";

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub site_id: Option<String>,
}

/// Heat line chart over the series periods
pub(crate) fn consumption_chart(points: &[ConsumptionPoint]) -> String {
    let labels: Vec<String> = points.iter().map(|p| p.period.clone()).collect();
    let heat = points.iter().map(|p| p.heat_kwh.unwrap_or(0.0)).collect();
    line_chart(&labels, &[Series::new("Heat (kWh)", heat)])
}

pub(crate) fn consumption_table(points: &[ConsumptionPoint]) -> Element {
    rsx! {
        table {
            thead { tr { th { "Period" } th { "Heat (kWh)" } th { "Water (m³)" } th { "Cost" } } }
            tbody {
                for point in points.iter() {
                    tr {
                        td { "{point.period}" }
                        td { {number(point.heat_kwh, 0)} }
                        td { {number(point.water_m3, 1)} }
                        td { {money(point.cost, "EUR")} }
                    }
                }
            }
        }
    }
}

fn consumption_view(points: &[ConsumptionPoint]) -> Element {
    if points.is_empty() {
        return rsx! { EmptyState { text: "No consumption recorded for this selection.".to_string() } };
    }
    let svg = consumption_chart(points);
    let total: f64 = points.iter().filter_map(|p| p.heat_kwh).sum();
    let total = number(Some(total / 1000.0), 1);
    let table = consumption_table(points);
    rsx! {
        div { class: "stat-grid",
            StatCard { label: "Heat delivered".to_string(), value: total, hint: Some("MWh in period".to_string()) }
        }
        Chart { svg }
        {table}
    }
}

#[component]
pub fn AnalyticsPage(
    viewer: Viewer,
    points: Loaded<Vec<ConsumptionPoint>>,
    sites: Vec<(String, String)>,
    site_id: Option<String>,
) -> Element {
    let body = loaded_view(&points, "/analytics", |p| consumption_view(p));

    rsx! {
        Layout {
            title: "Analytics".to_string(),
            nav_active: "analytics".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,

            h1 { "Consumption" }
            form { method: "get", action: "/analytics", class: "filters",
                select { name: "site_id",
                    option { value: "", selected: site_id.is_none(), "Whole network" }
                    for (id, name) in sites.iter() {
                        option { value: "{id}", selected: is_selected(&site_id, id), "{name}" }
                    }
                }
                button { r#type: "submit", "Show" }
            }
            {body}
        }
    }
}

/// GET /analytics?site_id=
pub async fn analytics_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<AnalyticsQuery>,
) -> Html<String> {
    let api = &state.api;
    let site_id = non_empty(&params.site_id).map(str::to_string);
    let path = filtered_path(CONSUMPTION_PATH, "site_id", site_id.as_deref());
    let (points, sites) = tokio::join!(
        api.load_list(&path, demo::consumption),
        api.load_list(SITES_PATH, demo::sites),
    );
    let sites = sites
        .into_data()
        .unwrap_or_default()
        .into_iter()
        .map(|s| (s.id.to_string(), s.name))
        .collect();

    render(rsx! {
        AnalyticsPage { viewer: Viewer::from(&session), points, sites, site_id }
    })
}

fn carbon_charts(report: &CarbonReport) -> (String, String) {
    let slices: Vec<(String, f64)> = report
        .by_source
        .iter()
        .map(|s| (s.source.clone(), s.tonnes.unwrap_or(0.0)))
        .collect();
    let labels: Vec<String> = report.monthly.iter().map(|m| m.month.clone()).collect();
    let monthly = report.monthly.iter().map(|m| m.tonnes.unwrap_or(0.0)).collect();
    (
        pie_chart(&slices),
        bar_chart(&labels, &[Series::new("tCO₂", monthly)]),
    )
}

fn carbon_view(report: &CarbonReport) -> Element {
    let (pie, bars) = carbon_charts(report);
    let reduction = report
        .reduction_pct
        .map(|pct| format!("{:.1} %", pct))
        .unwrap_or_else(|| "-".to_string());
    rsx! {
        div { class: "stat-grid",
            StatCard {
                label: "Emissions".to_string(),
                value: number(report.total_tco2, 1),
                hint: Some("tCO₂ in period".to_string()),
            }
            StatCard {
                label: "Reduction".to_string(),
                value: reduction,
                hint: Some("against baseline".to_string()),
            }
        }
        div { class: "chart-grid",
            if report.by_source.is_empty() {
                EmptyState { text: "No emissions by source reported.".to_string() }
            } else {
                Chart { svg: pie, caption: Some("By generation source".to_string()) }
            }
            if report.monthly.is_empty() {
                EmptyState { text: "No monthly emissions reported.".to_string() }
            } else {
                Chart { svg: bars, caption: Some("Monthly tCO₂".to_string()) }
            }
        }
    }
}

#[component]
pub fn CarbonPage(viewer: Viewer, report: Loaded<CarbonReport>) -> Element {
    let body = loaded_view(&report, "/carbon", carbon_view);

    rsx! {
        Layout {
            title: "Carbon".to_string(),
            nav_active: "carbon".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,

            h1 { "Carbon Report" }
            {body}
        }
    }
}

/// GET /carbon
pub async fn carbon_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Html<String> {
    let report = state.api.load_record(CARBON_PATH, demo::carbon).await;
    render(rsx! {
        CarbonPage { viewer: Viewer::from(&session), report }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carbon_pie_has_slice_per_source() {
        let report = demo::carbon();
        let (pie, bars) = carbon_charts(&report);
        assert_eq!(pie.matches("<path").count(), report.by_source.len());
        assert!(bars.contains("<svg"));
    }

    #[test]
    fn empty_consumption_shows_empty_state() {
        let html = dioxus::ssr::render_element(consumption_view(&[]));
        assert!(html.contains("No consumption recorded"));
    }
}
