//! Billing: invoice list with status filter, and the finance overview.

use axum::extract::{Query, State};
use axum::response::Html;
use axum::Extension;
use dioxus::prelude::*;
use serde::Deserialize;

use super::{is_selected, non_empty, Viewer};
use crate::api::AppState;
use crate::auth::Session;
use crate::charts::{bar_chart, Series};
use crate::demo;
use crate::model::{FinanceSummary, Invoice};
use crate::ui::components::widgets::{count, money, text};
use crate::ui::components::{loaded_view, Chart, EmptyState, Layout, StatCard};
use crate::ui::render;
use crate::upstream::Loaded;

const INVOICES_PATH: &str = "/api/billing/invoices";
const FINANCE_PATH: &str = "/api/analytics/finance";

const STATUS_FILTERS: [(&str, &str); 3] = [("open", "Open"), ("overdue", "Overdue"), ("paid", "Paid")];

#[derive(Debug, Default, Deserialize)]
pub struct BillingQuery {
    pub status: Option<String>,
}

/// Invoices whose effective status is `status` (all when `None`)
fn select_invoices(invoices: &[Invoice], status: Option<&str>) -> Vec<Invoice> {
    invoices
        .iter()
        .filter(|inv| status.map_or(true, |s| inv.status_key() == s))
        .cloned()
        .collect()
}

/// Sum of invoice amounts per currency, in first-seen order
fn totals(invoices: &[Invoice]) -> Vec<(String, f64)> {
    let mut out: Vec<(String, f64)> = Vec::new();
    for inv in invoices {
        let Some(amount) = inv.amount else { continue };
        let currency = inv.currency_or_default();
        match out.iter_mut().find(|(c, _)| c == currency) {
            Some((_, sum)) => *sum += amount,
            None => out.push((currency.to_string(), amount)),
        }
    }
    out
}

fn invoice_label(inv: &Invoice) -> String {
    inv.number.clone().unwrap_or_else(|| inv.id.to_string())
}

fn status_badge(key: &str) -> &'static str {
    match key {
        "paid" => "status-ok",
        "overdue" => "status-err",
        _ => "status-warn",
    }
}

pub(crate) fn invoice_table(invoices: &[Invoice]) -> Element {
    if invoices.is_empty() {
        return rsx! { EmptyState { text: "No invoices match the current filter.".to_string() } };
    }
    let sums: Vec<String> = totals(invoices)
        .into_iter()
        .map(|(currency, sum)| money(Some(sum), &currency))
        .collect();
    let total = sums.join(" + ");
    rsx! {
        table {
            thead {
                tr {
                    th { "Invoice" } th { "Customer" } th { "Period" }
                    th { "Amount" } th { "Due" } th { "Status" }
                }
            }
            tbody {
                for inv in invoices.iter() {
                    tr {
                        td { {invoice_label(inv)} }
                        td { {text(inv.customer.as_deref())} }
                        td { {text(inv.period.as_deref())} }
                        td { {money(inv.amount, inv.currency_or_default())} }
                        td { {text(inv.due_date.as_deref())} }
                        td { class: status_badge(inv.status_key()), {inv.status_key()} }
                    }
                }
            }
            tfoot {
                tr {
                    th { colspan: "3", "Total" }
                    th { colspan: "3", "{total}" }
                }
            }
        }
    }
}

#[component]
pub fn BillingPage(
    viewer: Viewer,
    invoices: Loaded<Vec<Invoice>>,
    status: Option<String>,
) -> Element {
    let body = loaded_view(&invoices, "/billing", |inv| invoice_table(inv));

    rsx! {
        Layout {
            title: "Billing".to_string(),
            nav_active: "billing".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,

            h1 { "Billing" }
            form { method: "get", action: "/billing", class: "filters",
                select { name: "status",
                    option { value: "", selected: status.is_none(), "All invoices" }
                    for (value, label) in STATUS_FILTERS.iter() {
                        option { value: *value, selected: is_selected(&status, value), "{label}" }
                    }
                }
                button { r#type: "submit", "Filter" }
            }
            {body}
        }
    }
}

/// GET /billing?status=
pub async fn billing_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<BillingQuery>,
) -> Html<String> {
    let status = non_empty(&params.status).map(str::to_lowercase);
    let invoices = state
        .api
        .load_list(INVOICES_PATH, demo::invoices)
        .await
        .map(|all| select_invoices(&all, status.as_deref()));

    render(rsx! {
        BillingPage { viewer: Viewer::from(&session), invoices, status }
    })
}

fn finance_chart(summary: &FinanceSummary) -> String {
    let labels: Vec<String> = summary.monthly.iter().map(|m| m.month.clone()).collect();
    let revenue = summary.monthly.iter().map(|m| m.revenue.unwrap_or(0.0)).collect();
    let outstanding = summary
        .monthly
        .iter()
        .map(|m| m.outstanding.unwrap_or(0.0))
        .collect();
    bar_chart(
        &labels,
        &[Series::new("Revenue", revenue), Series::new("Outstanding", outstanding)],
    )
}

fn finance_view(summary: &FinanceSummary) -> Element {
    let chart = (!summary.monthly.is_empty()).then(|| finance_chart(summary));
    rsx! {
        div { class: "stat-grid",
            StatCard { label: "Revenue".to_string(), value: money(summary.revenue_total, "EUR") }
            StatCard { label: "Outstanding".to_string(), value: money(summary.outstanding_total, "EUR") }
            StatCard { label: "Overdue invoices".to_string(), value: count(summary.overdue_count) }
        }
        if let Some(svg) = chart {
            Chart { svg, caption: Some("Monthly revenue and outstanding amounts".to_string()) }
        } else {
            EmptyState { text: "No monthly figures available.".to_string() }
        }
    }
}

#[component]
pub fn FinancePage(viewer: Viewer, summary: Loaded<FinanceSummary>) -> Element {
    let body = loaded_view(&summary, "/finance", finance_view);

    rsx! {
        Layout {
            title: "Finance".to_string(),
            nav_active: "finance".to_string(),
            user: viewer.username.clone(),
            demo_session: viewer.demo,

            h1 { "Finance" }
            {body}
        }
    }
}

/// GET /finance
pub async fn finance_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Html<String> {
    let summary = state.api.load_record(FINANCE_PATH, demo::finance).await;
    render(rsx! {
        FinancePage { viewer: Viewer::from(&session), summary }
    })
}
