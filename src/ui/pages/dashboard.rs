//! Dashboard page.
//!
//! Shows the network overview:
//! - Counters for sites, meters, gateways, open tasks and unpaid invoices
//! - Gateway connection status
//! - Recent M-Bus read jobs

use axum::extract::State;
use axum::response::Html;
use axum::Extension;
use dioxus::prelude::*;

use super::{status_class, Viewer};
use crate::api::AppState;
use crate::auth::Session;
use crate::demo;
use crate::model::{DashboardStats, Gateway, ReadJob};
use crate::ui::components::widgets::{count, number, text};
use crate::ui::components::{loaded_view, EmptyState, Layout, StatCard};
use crate::ui::render;
use crate::upstream::Loaded;

const STATS_PATH: &str = "/api/dashboard/stats";
const GATEWAYS_PATH: &str = "/api/mbus/gateways";
const JOBS_PATH: &str = "/api/mbus/jobs";

fn stat_cards(stats: &DashboardStats) -> Element {
    let gateways = match (stats.gateways_online, stats.gateways_total) {
        (Some(online), Some(total)) => format!("{} / {}", online, total),
        (online, total) => count(online.or(total)),
    };
    rsx! {
        div { class: "stat-grid",
            StatCard { label: "Sites".to_string(), value: count(stats.sites) }
            StatCard { label: "Buildings".to_string(), value: count(stats.buildings) }
            StatCard { label: "Meters".to_string(), value: count(stats.meters) }
            StatCard {
                label: "Gateways online".to_string(),
                value: gateways,
            }
            StatCard { label: "Open tasks".to_string(), value: count(stats.open_tasks) }
            StatCard { label: "Unpaid invoices".to_string(), value: count(stats.unpaid_invoices) }
            StatCard {
                label: "Heat delivered".to_string(),
                value: number(stats.heat_delivered_mwh, 1),
                hint: Some("MWh this month".to_string()),
            }
        }
    }
}

fn gateway_table(gateways: &[Gateway]) -> Element {
    if gateways.is_empty() {
        return rsx! { EmptyState { text: "No gateways registered.".to_string() } };
    }
    rsx! {
        table {
            thead { tr { th { "Gateway" } th { "Endpoint" } th { "Status" } th { "Last seen" } } }
            tbody {
                for gw in gateways.iter() {
                    tr {
                        td { a { href: "/gateways", "{gw.name}" } }
                        td { code { {gw.endpoint()} } }
                        td { class: status_class(gw.is_online()),
                            if gw.is_online() { "Online" } else { "Offline" }
                        }
                        td { {text(gw.last_seen.as_deref())} }
                    }
                }
            }
        }
    }
}

fn job_table(jobs: &[ReadJob]) -> Element {
    if jobs.is_empty() {
        return rsx! { EmptyState { text: "No read jobs yet.".to_string() } };
    }
    rsx! {
        table {
            thead { tr { th { "Job" } th { "Gateway" } th { "Status" } th { "Started" } th { "Meters read" } } }
            tbody {
                for job in jobs.iter().take(10) {
                    tr {
                        td { code { "{job.id}" } }
                        td { {job.gateway_id.as_ref().map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())} }
                        td { {text(job.status.as_deref())} }
                        td { {text(job.started_at.as_deref())} }
                        td { {count(job.meters_read)} }
                    }
                }
            }
        }
    }
}

#[component]
pub fn DashboardPage(
    viewer: Viewer,
    stats: Loaded<DashboardStats>,
    gateways: Loaded<Vec<Gateway>>,
    jobs: Loaded<Vec<ReadJob>>,
) -> Element {
    let stats_view = loaded_view(&stats, "/", stat_cards);
    let gateways_view = loaded_view(&gateways, "/", |gws| gateway_table(gws));
    let jobs_view = loaded_view(&jobs, "/", |jobs| job_table(jobs));

    rsx! {
        Layout {
            title: "Dashboard".to_string(),
            nav_active: "dashboard".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,

            h1 { "Dashboard" }
            section { id: "stats", {stats_view} }
            section { id: "gateways",
                hgroup {
                    h2 { "Gateways" }
                    p { "M-Bus gateway connection status" }
                }
                {gateways_view}
            }
            section { id: "jobs",
                hgroup {
                    h2 { "Recent read jobs" }
                    p { "Latest scheduled and manual meter reads" }
                }
                {jobs_view}
            }
        }
    }
}

/// GET / - stats, gateways and read jobs, fetched concurrently
pub async fn dashboard_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Html<String> {
    let api = &state.api;
    let (stats, gateways, jobs) = tokio::join!(
        api.load_record(STATS_PATH, demo::dashboard_stats),
        api.load_list(GATEWAYS_PATH, demo::gateways),
        api.load_list(JOBS_PATH, demo::read_jobs),
    );
    render(rsx! {
        DashboardPage { viewer: Viewer::from(&session), stats, gateways, jobs }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer() -> Viewer {
        Viewer {
            username: "ops".to_string(),
            demo: false,
        }
    }

    #[test]
    fn gateways_shown_as_online_of_total() {
        let stats = DashboardStats {
            gateways_online: Some(3),
            gateways_total: Some(4),
            ..Default::default()
        };
        let html = dioxus::ssr::render_element(stat_cards(&stats));
        assert!(html.contains("3 / 4"));
    }

    #[test]
    fn each_section_settles_on_its_own() {
        let html = dioxus::ssr::render_element(rsx! {
            DashboardPage {
                viewer: viewer(),
                stats: Loaded::Demo(demo::dashboard_stats()),
                gateways: Loaded::Live(Vec::new()),
                jobs: Loaded::Failed("Could not reach the metering API".to_string()),
            }
        });
        assert!(html.contains("Demo data"));
        assert!(html.contains("No gateways registered."));
        assert!(html.contains("Could not reach the metering API"));
        assert!(html.contains("Retry"));
    }
}
