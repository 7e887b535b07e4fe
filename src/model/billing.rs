//! Invoices and finance summaries

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de::{list_or_empty, opt_count, opt_number, opt_string, string_or_empty};
use super::{Record, RecordId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, deserialize_with = "opt_string", alias = "invoice_number")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "opt_string", alias = "customer_name")]
    pub customer: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub period: Option<String>,
    #[serde(default, deserialize_with = "opt_number", alias = "total")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub due_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Invoice {
    pub fn is_paid(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("paid"))
    }

    /// Explicitly overdue, or unpaid with a due date before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        if self.is_paid() {
            return false;
        }
        if self
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("overdue"))
        {
            return true;
        }
        self.due_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.get(..10).unwrap_or(d), "%Y-%m-%d").ok())
            .is_some_and(|due| due < today)
    }

    pub fn is_overdue_now(&self) -> bool {
        self.is_overdue(Utc::now().date_naive())
    }

    /// Effective status used by the billing filter
    pub fn status_key(&self) -> &'static str {
        if self.is_paid() {
            "paid"
        } else if self.is_overdue_now() {
            "overdue"
        } else {
            "open"
        }
    }

    pub fn currency_or_default(&self) -> &str {
        self.currency.as_deref().unwrap_or("EUR")
    }
}

impl Record for Invoice {
    const KIND: &'static str = "invoice";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinanceMonth {
    #[serde(default, deserialize_with = "string_or_empty", alias = "period")]
    pub month: String,
    #[serde(default, deserialize_with = "opt_number")]
    pub revenue: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub outstanding: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinanceSummary {
    #[serde(default, deserialize_with = "opt_number", alias = "revenue")]
    pub revenue_total: Option<f64>,
    #[serde(default, deserialize_with = "opt_number", alias = "outstanding")]
    pub outstanding_total: Option<f64>,
    #[serde(default, deserialize_with = "opt_count", alias = "overdue")]
    pub overdue_count: Option<u32>,
    #[serde(default, deserialize_with = "list_or_empty", alias = "months")]
    pub monthly: Vec<FinanceMonth>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn overdue_rules() {
        let today = day("2026-10-18");
        let mut invoice = Invoice {
            status: Some("open".into()),
            due_date: Some("2026-10-01T00:00:00Z".into()),
            ..Default::default()
        };
        assert!(invoice.is_overdue(today));

        invoice.status = Some("Paid".into());
        assert!(invoice.is_paid());
        assert!(!invoice.is_overdue(today));

        invoice.status = Some("open".into());
        invoice.due_date = Some("2026-12-01".into());
        assert!(!invoice.is_overdue(today));

        invoice.due_date = Some("soon".into());
        assert!(!invoice.is_overdue(today));
    }

    #[test]
    fn finance_summary_aliases() {
        let summary: FinanceSummary = serde_json::from_str(
            r#"{"revenue": "120000.5", "outstanding": 800, "months": [{"period": "2026-09", "revenue": 10}]}"#,
        )
        .unwrap();
        assert_eq!(summary.revenue_total, Some(120000.5));
        assert_eq!(summary.outstanding_total, Some(800.0));
        assert_eq!(summary.monthly.len(), 1);
        assert_eq!(summary.monthly[0].month, "2026-09");
    }
}
