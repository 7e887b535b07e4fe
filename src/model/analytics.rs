//! Dashboard counters, consumption series and carbon reporting

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de::{list_or_empty, opt_count, opt_number, string_or_empty};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default, deserialize_with = "opt_count", alias = "total_sites")]
    pub sites: Option<u32>,
    #[serde(default, deserialize_with = "opt_count", alias = "total_buildings")]
    pub buildings: Option<u32>,
    #[serde(default, deserialize_with = "opt_count", alias = "total_meters")]
    pub meters: Option<u32>,
    #[serde(default, deserialize_with = "opt_count")]
    pub gateways_online: Option<u32>,
    #[serde(default, deserialize_with = "opt_count", alias = "gateways")]
    pub gateways_total: Option<u32>,
    #[serde(default, deserialize_with = "opt_count")]
    pub open_tasks: Option<u32>,
    #[serde(default, deserialize_with = "opt_count")]
    pub unpaid_invoices: Option<u32>,
    #[serde(default, deserialize_with = "opt_number")]
    pub heat_delivered_mwh: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One bucket of a consumption series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionPoint {
    #[serde(default, deserialize_with = "string_or_empty", alias = "month", alias = "date")]
    pub period: String,
    #[serde(default, deserialize_with = "opt_number", alias = "value", alias = "kwh")]
    pub heat_kwh: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub water_m3: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub cost: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarbonSource {
    #[serde(default, deserialize_with = "string_or_empty", alias = "name")]
    pub source: String,
    #[serde(default, deserialize_with = "opt_number", alias = "tco2")]
    pub tonnes: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarbonMonth {
    #[serde(default, deserialize_with = "string_or_empty", alias = "period")]
    pub month: String,
    #[serde(default, deserialize_with = "opt_number", alias = "tco2")]
    pub tonnes: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarbonReport {
    #[serde(default, deserialize_with = "opt_number", alias = "total")]
    pub total_tco2: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub reduction_pct: Option<f64>,
    #[serde(default, deserialize_with = "list_or_empty", alias = "sources")]
    pub by_source: Vec<CarbonSource>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub monthly: Vec<CarbonMonth>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumption_point_aliases() {
        let points: Vec<ConsumptionPoint> = serde_json::from_str(
            r#"[{"month": "2026-01", "value": "5200"}, {"date": "2026-02", "kwh": 4800, "cost": 610.2}]"#,
        )
        .unwrap();
        assert_eq!(points[0].period, "2026-01");
        assert_eq!(points[0].heat_kwh, Some(5200.0));
        assert_eq!(points[1].heat_kwh, Some(4800.0));
        assert_eq!(points[1].cost, Some(610.2));
    }

    #[test]
    fn stats_tolerate_partial_payloads() {
        let stats: DashboardStats =
            serde_json::from_str(r#"{"total_sites": 12, "gateways": "7"}"#).unwrap();
        assert_eq!(stats.sites, Some(12));
        assert_eq!(stats.gateways_total, Some(7));
        assert_eq!(stats.meters, None);
    }

    #[test]
    fn carbon_report_with_null_parts() {
        let report: CarbonReport = serde_json::from_str(
            r#"{"total": 41.5, "sources": null, "monthly": [{"month": null, "tco2": 3.2}]}"#,
        )
        .unwrap();
        assert_eq!(report.total_tco2, Some(41.5));
        assert!(report.by_source.is_empty());
        assert_eq!(report.monthly.len(), 1);
        assert_eq!(report.monthly[0].month, "");
        assert_eq!(report.monthly[0].tonnes, Some(3.2));
    }
}
