//! Sites, site detail and buildings pages.

use axum::extract::{Path, Query, State};
use axum::response::Html;
use axum::Extension;
use dioxus::prelude::*;
use serde::Deserialize;

use super::{is_selected, non_empty, Viewer};
use crate::api::AppState;
use crate::auth::Session;
use crate::demo;
use crate::model::{Building, Site};
use crate::records::{filter_records, sort_records, SortOrder};
use crate::ui::components::widgets::{count, number, text};
use crate::ui::components::{loaded_view, EmptyState, Layout};
use crate::ui::{filtered_path, render};
use crate::upstream::Loaded;

const SITES_PATH: &str = "/api/sites";
const BUILDINGS_PATH: &str = "/api/buildings";

#[derive(Debug, Default, Deserialize)]
pub struct SitesQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BuildingsQuery {
    pub site_id: Option<String>,
}

fn site_table(sites: &[Site], query: &str, total: usize) -> Element {
    if sites.is_empty() {
        let message = if total == 0 {
            "No sites yet. Sites appear here once they are registered in the metering API."
                .to_string()
        } else {
            format!("No sites match \"{}\".", query)
        };
        return rsx! { EmptyState { text: message } };
    }
    let shown = sites.len();
    rsx! {
        table {
            thead {
                tr { th { "Site" } th { "Address" } th { "City" } th { "Buildings" } th { "Meters" } th { "Status" } }
            }
            tbody {
                for site in sites.iter() {
                    tr {
                        td { a { href: "/sites/{site.id}", "{site.name}" } }
                        td { {text(site.address.as_deref())} }
                        td { {text(site.city.as_deref())} }
                        td { {count(site.building_count)} }
                        td { {count(site.meter_count)} }
                        td { {text(site.status.as_deref())} }
                    }
                }
            }
        }
        small { "{shown} of {total} sites" }
    }
}

#[component]
pub fn SitesPage(
    viewer: Viewer,
    sites: Loaded<Vec<Site>>,
    query: String,
    sort: Option<String>,
    total: usize,
) -> Element {
    let body = loaded_view(&sites, "/sites", |sites| site_table(sites, &query, total));

    rsx! {
        Layout {
            title: "Sites".to_string(),
            nav_active: "sites".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,

            h1 { "Sites" }
            form { method: "get", action: "/sites", class: "filters",
                input { r#type: "search", name: "q", value: "{query}", placeholder: "Search by name, address or city" }
                select { name: "sort",
                    option { value: "", selected: sort.is_none(), "API order" }
                    option { value: "name", selected: is_selected(&sort, "name"), "Name A-Z" }
                    option { value: "-name", selected: is_selected(&sort, "-name"), "Name Z-A" }
                }
                button { r#type: "submit", "Search" }
            }
            {body}
        }
    }
}

/// GET /sites?q=&sort=
pub async fn sites_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<SitesQuery>,
) -> Html<String> {
    let loaded = state.api.load_list(SITES_PATH, demo::sites).await;
    let total = loaded.data().map(Vec::len).unwrap_or(0);
    let query = params.q.clone().unwrap_or_default();
    let order = SortOrder::parse(non_empty(&params.sort));
    let sites = loaded.map(|sites| {
        let mut matches = filter_records(&sites, &query);
        sort_records(&mut matches, order);
        matches
    });
    let sort = non_empty(&params.sort).map(str::to_string);

    render(rsx! {
        SitesPage { viewer: Viewer::from(&session), sites, query, sort, total }
    })
}

fn building_table(buildings: &[Building], show_site: bool) -> Element {
    if buildings.is_empty() {
        return rsx! { EmptyState { text: "No buildings found.".to_string() } };
    }
    rsx! {
        table {
            thead {
                tr {
                    th { "Building" }
                    if show_site { th { "Site" } }
                    th { "Address" }
                    th { "Heated area (m²)" }
                    th { "Units" }
                }
            }
            tbody {
                for building in buildings.iter() {
                    tr {
                        td { "{building.name}" }
                        if show_site {
                            td {
                                if let Some(site_id) = &building.site_id {
                                    a { href: "/sites/{site_id}", "{site_id}" }
                                } else {
                                    "-"
                                }
                            }
                        }
                        td { {text(building.address.as_deref())} }
                        td { {number(building.heated_area_m2, 0)} }
                        td { {count(building.units)} }
                    }
                }
            }
        }
    }
}

fn site_summary(site: &Site) -> Element {
    rsx! {
        article {
            dl {
                dt { "Address" }
                dd { {text(site.address.as_deref())} }
                dt { "City" }
                dd { {text(site.city.as_deref())} }
                dt { "Status" }
                dd { {text(site.status.as_deref())} }
                dt { "Meters" }
                dd { {count(site.meter_count)} }
            }
            a { href: "/meters?site_id={site.id}", "Meters at this site" }
            " · "
            a { href: "/analytics?site_id={site.id}", "Consumption" }
        }
    }
}

#[component]
pub fn SiteDetailPage(
    viewer: Viewer,
    site_id: String,
    site: Loaded<Site>,
    buildings: Loaded<Vec<Building>>,
) -> Element {
    let retry = format!("/sites/{}", site_id);
    let title = site
        .data()
        .map(|s| s.name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("Site {}", site_id));
    let summary = loaded_view(&site, &retry, site_summary);
    let building_list = loaded_view(&buildings, &retry, |b| building_table(b, false));

    rsx! {
        Layout {
            title: title.clone(),
            nav_active: "sites".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,

            p { a { href: "/sites", "← All sites" } }
            h1 { "{title}" }
            {summary}
            h2 { "Buildings" }
            {building_list}
        }
    }
}

/// GET /sites/{id}
pub async fn site_detail_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(site_id): Path<String>,
) -> Html<String> {
    let api = &state.api;
    let site_path = format!("{}/{}", SITES_PATH, urlencoding::encode(&site_id));
    let buildings_path = filtered_path(BUILDINGS_PATH, "site_id", Some(&site_id));
    let (site, buildings) = tokio::join!(
        api.load_record(&site_path, || demo::site(&site_id)),
        api.load_list(&buildings_path, demo::buildings),
    );
    let buildings = buildings.map(|all| buildings_of(all, Some(&site_id)));

    render(rsx! {
        SiteDetailPage { viewer: Viewer::from(&session), site_id, site, buildings }
    })
}

/// Keep buildings of `site_id`; records without a site are kept, since the
/// API already filtered them
fn buildings_of(buildings: Vec<Building>, site_id: Option<&str>) -> Vec<Building> {
    match site_id {
        Some(site_id) => buildings
            .into_iter()
            .filter(|b| b.site_id.as_ref().map_or(true, |id| id.as_str() == site_id))
            .collect(),
        None => buildings,
    }
}

#[component]
pub fn BuildingsPage(
    viewer: Viewer,
    buildings: Loaded<Vec<Building>>,
    sites: Vec<Site>,
    site_id: Option<String>,
) -> Element {
    let body = loaded_view(&buildings, "/buildings", |b| building_table(b, site_id.is_none()));

    rsx! {
        Layout {
            title: "Buildings".to_string(),
            nav_active: "buildings".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,

            h1 { "Buildings" }
            form { method: "get", action: "/buildings", class: "filters",
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
                button { r#type: "submit", "Filter" }
            }
            {body}
        }
    }
}

/// GET /buildings?site_id=
pub async fn buildings_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<BuildingsQuery>,
) -> Html<String> {
    let api = &state.api;
    let site_id = non_empty(&params.site_id).map(str::to_string);
    let buildings_path = filtered_path(BUILDINGS_PATH, "site_id", site_id.as_deref());
    let (buildings, sites) = tokio::join!(
        api.load_list(&buildings_path, demo::buildings),
        api.load_list(SITES_PATH, demo::sites),
    );
    let buildings = buildings.map(|all| buildings_of(all, site_id.as_deref()));
    let sites = sites.into_data().unwrap_or_default();

    render(rsx! {
        BuildingsPage { viewer: Viewer::from(&session), buildings, sites, site_id }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordId;

    #[test]
    fn buildings_filter_by_site() {
        let all = demo::buildings();
        let total = all.len();
        let filtered = buildings_of(all.clone(), Some("s-1"));
        assert!(!filtered.is_empty());
        assert!(filtered.len() < total);
        assert!(filtered
            .iter()
            .all(|b| b.site_id.as_ref() == Some(&RecordId::from("s-1"))));
        assert_eq!(buildings_of(all, None).len(), total);
    }
}
