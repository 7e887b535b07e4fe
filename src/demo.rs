//! Built-in demo datasets
//!
//! Shown (with a visible banner) when the metering API cannot be reached.
//! The data is fixed so screenshots and tests are stable.

use serde_json::Map;

use crate::model::{
    Building, CarbonMonth, CarbonReport, CarbonSource, ConsumptionPoint, DashboardStats,
    FinanceMonth, FinanceSummary, Gateway, Goal, Invoice, MaintenanceTask, ManualEntry, Meter,
    MeterReading, ReadJob, RecordId, RemoteStatus, Site, TenantProfile,
};

const MONTHS: [&str; 6] = [
    "2026-04", "2026-05", "2026-06", "2026-07", "2026-08", "2026-09",
];

fn id(s: &str) -> RecordId {
    RecordId::from(s)
}

fn text(s: &str) -> Option<String> {
    Some(s.to_string())
}

pub fn sites() -> Vec<Site> {
    [
        ("s-1", "Nordhafen Quarter", "Hafenstraße 12", "Hamburg", 4, 38, "active"),
        ("s-2", "Lindenhof Estate", "Lindenallee 3", "Bremen", 3, 21, "active"),
        ("s-3", "Am Wasserturm", "Turmweg 8", "Kiel", 2, 12, "commissioning"),
    ]
    .into_iter()
    .map(|(sid, name, address, city, buildings, meters, status)| Site {
        id: id(sid),
        name: name.to_string(),
        address: text(address),
        city: text(city),
        building_count: Some(buildings),
        meter_count: Some(meters),
        status: text(status),
        extra: Map::new(),
    })
    .collect()
}

pub fn site(site_id: &str) -> Site {
    sites()
        .into_iter()
        .find(|s| s.id.as_str() == site_id)
        .unwrap_or_else(|| Site {
            id: id(site_id),
            name: format!("Site {}", site_id),
            ..Default::default()
        })
}

pub fn buildings() -> Vec<Building> {
    [
        ("b-1", "s-1", "Block A", "Hafenstraße 12a", 2480.0, 32),
        ("b-2", "s-1", "Block B", "Hafenstraße 12b", 2310.0, 30),
        ("b-3", "s-1", "Block C", "Hafenstraße 14", 1720.0, 22),
        ("b-4", "s-1", "Kita Nordhafen", "Hafenstraße 16", 640.0, 1),
        ("b-5", "s-2", "Haus 1", "Lindenallee 3", 1180.0, 14),
        ("b-6", "s-2", "Haus 2", "Lindenallee 5", 1180.0, 14),
        ("b-7", "s-2", "Haus 3", "Lindenallee 7", 960.0, 10),
        ("b-8", "s-3", "Turmhaus", "Turmweg 8", 1450.0, 18),
        ("b-9", "s-3", "Remise", "Turmweg 10", 310.0, 2),
    ]
    .into_iter()
    .map(|(bid, sid, name, address, area, units)| Building {
        id: id(bid),
        site_id: Some(id(sid)),
        name: name.to_string(),
        address: text(address),
        heated_area_m2: Some(area),
        units: Some(units),
        extra: Map::new(),
    })
    .collect()
}

pub fn meters() -> Vec<Meter> {
    [
        ("m-1", "44031201", "heat", "s-1", "b-1", "gw-1", 1, 18234.5, "kWh"),
        ("m-2", "44031202", "heat", "s-1", "b-2", "gw-1", 2, 16120.0, "kWh"),
        ("m-3", "44031203", "heat", "s-1", "b-3", "gw-1", 3, 11408.2, "kWh"),
        ("m-4", "71550017", "water", "s-1", "b-1", "gw-1", 10, 842.31, "m³"),
        ("m-5", "44031290", "heat", "s-2", "b-5", "gw-2", 1, 9021.7, "kWh"),
        ("m-6", "44031291", "heat", "s-2", "b-6", "gw-2", 2, 8875.3, "kWh"),
        ("m-7", "71550102", "water", "s-2", "b-7", "gw-2", 11, 401.9, "m³"),
        ("m-8", "44031340", "heat", "s-3", "b-8", "gw-3", 1, 2210.0, "kWh"),
    ]
    .into_iter()
    .map(
        |(mid, serial, medium, sid, bid, gw, address, value, unit)| Meter {
            id: id(mid),
            serial: text(serial),
            medium: text(medium),
            site_id: Some(id(sid)),
            building_id: Some(id(bid)),
            gateway_id: Some(id(gw)),
            primary_address: Some(address),
            last_value: Some(value),
            unit: text(unit),
            last_read_at: text("2026-10-17T23:00:00Z"),
            status: text("ok"),
            extra: Map::new(),
        },
    )
    .collect()
}

pub fn meter(meter_id: &str) -> Meter {
    meters()
        .into_iter()
        .find(|m| m.id.as_str() == meter_id)
        .unwrap_or_else(|| Meter {
            id: id(meter_id),
            ..Default::default()
        })
}

/// Fourteen daily readings ending at the meter's last value
pub fn meter_readings(meter_id: &str) -> Vec<MeterReading> {
    let meter = meter(meter_id);
    let last = meter.last_value.unwrap_or(1000.0);
    let unit = meter.unit.clone().unwrap_or_else(|| "kWh".to_string());
    let daily = (last / 400.0).max(1.0);
    (0..14)
        .map(|day| {
            let value = last - daily * f64::from(13 - day);
            MeterReading {
                meter_id: id(meter_id),
                timestamp: Some(format!("2026-10-{:02}", day + 4)),
                value: Some((value * 10.0).round() / 10.0),
                unit: Some(unit.clone()),
                extra: Map::new(),
            }
        })
        .collect()
}

pub fn gateways() -> Vec<Gateway> {
    [
        ("gw-1", "Nordhafen substation", "10.20.1.10", "s-1", true, "2.4.1"),
        ("gw-2", "Lindenhof boiler room", "10.20.2.10", "s-2", true, "2.4.1"),
        ("gw-3", "Wasserturm cellar", "10.20.3.10", "s-3", false, "2.3.7"),
    ]
    .into_iter()
    .map(|(gid, name, host, sid, online, firmware)| Gateway {
        id: id(gid),
        name: name.to_string(),
        host: text(host),
        port: Some(10001),
        site_id: Some(id(sid)),
        status: text(if online { "online" } else { "offline" }),
        online: Some(online),
        last_seen: text(if online {
            "2026-10-18T08:55:00Z"
        } else {
            "2026-10-16T14:02:00Z"
        }),
        firmware: text(firmware),
        extra: Map::new(),
    })
    .collect()
}

pub fn read_jobs() -> Vec<ReadJob> {
    [
        ("j-104", "gw-1", "completed", "2026-10-18T06:00:00Z", Some("2026-10-18T06:02:11Z"), Some(4)),
        ("j-103", "gw-2", "completed", "2026-10-18T06:00:00Z", Some("2026-10-18T06:01:40Z"), Some(3)),
        ("j-102", "gw-3", "failed", "2026-10-18T06:00:00Z", None, Some(0)),
        ("j-101", "gw-1", "completed", "2026-10-17T06:00:00Z", Some("2026-10-17T06:02:05Z"), Some(4)),
    ]
    .into_iter()
    .map(|(jid, gw, status, started, finished, read)| ReadJob {
        id: id(jid),
        gateway_id: Some(id(gw)),
        status: text(status),
        started_at: text(started),
        finished_at: finished.map(str::to_string),
        meters_read: read,
        extra: Map::new(),
    })
    .collect()
}

pub fn dashboard_stats() -> DashboardStats {
    let gateways = gateways();
    DashboardStats {
        sites: Some(sites().len() as u32),
        buildings: Some(buildings().len() as u32),
        meters: Some(meters().len() as u32),
        gateways_online: Some(gateways.iter().filter(|g| g.is_online()).count() as u32),
        gateways_total: Some(gateways.len() as u32),
        open_tasks: Some(maintenance_tasks().iter().filter(|t| t.is_open()).count() as u32),
        unpaid_invoices: Some(invoices().iter().filter(|i| !i.is_paid()).count() as u32),
        heat_delivered_mwh: Some(412.7),
        extra: Map::new(),
    }
}

pub fn remote_status(gateway_id: &str) -> RemoteStatus {
    RemoteStatus {
        gateway_id: id(gateway_id),
        state: text("idle"),
        baud_rate: Some(2400),
        last_command: text("read_all"),
        last_response: text("4 meters answered"),
        updated_at: text("2026-10-18T06:02:11Z"),
        extra: Map::new(),
    }
}

pub fn maintenance_tasks() -> Vec<MaintenanceTask> {
    [
        ("t-1", "Replace differential pressure sensor", "s-1", "high", "open", "2026-10-24", "J. Petersen"),
        ("t-2", "Annual substation inspection", "s-2", "normal", "in_progress", "2026-11-05", "M. Kühn"),
        ("t-3", "Recalibrate water meter 71550102", "s-2", "low", "open", "2026-12-01", "M. Kühn"),
        ("t-4", "Gateway firmware update", "s-3", "normal", "done", "2026-10-10", "IT Ops"),
    ]
    .into_iter()
    .map(|(tid, title, sid, priority, status, due, assignee)| MaintenanceTask {
        id: id(tid),
        title: title.to_string(),
        description: None,
        site_id: Some(id(sid)),
        priority: text(priority),
        status: text(status),
        due_date: text(due),
        assignee: text(assignee),
        extra: Map::new(),
    })
    .collect()
}

pub fn invoices() -> Vec<Invoice> {
    [
        ("i-1", "HN-2026-0912", "WG Nordhafen eG", "2026-09", 18420.50, "paid", "2026-10-15"),
        ("i-2", "HN-2026-0913", "Lindenhof Verwaltung", "2026-09", 9310.00, "open", "2026-10-30"),
        ("i-3", "HN-2026-0817", "Stadtwerke Kiel", "2026-08", 2755.80, "overdue", "2026-09-30"),
        ("i-4", "HN-2026-0914", "Kita Nordhafen", "2026-09", 612.40, "open", "2026-10-30"),
    ]
    .into_iter()
    .map(|(iid, number, customer, period, amount, status, due)| Invoice {
        id: id(iid),
        number: text(number),
        customer: text(customer),
        period: text(period),
        amount: Some(amount),
        currency: text("EUR"),
        status: text(status),
        due_date: text(due),
        extra: Map::new(),
    })
    .collect()
}

pub fn finance() -> FinanceSummary {
    let revenue = [28100.0, 21400.0, 16900.0, 15800.0, 17200.0, 31098.7];
    let outstanding = [0.0, 0.0, 1200.0, 0.0, 2755.8, 9922.4];
    FinanceSummary {
        revenue_total: Some(revenue.iter().sum()),
        outstanding_total: Some(12678.2),
        overdue_count: Some(1),
        monthly: MONTHS
            .iter()
            .zip(revenue.iter().zip(outstanding.iter()))
            .map(|(month, (rev, out))| FinanceMonth {
                month: month.to_string(),
                revenue: Some(*rev),
                outstanding: Some(*out),
            })
            .collect(),
        extra: Map::new(),
    }
}

pub fn consumption() -> Vec<ConsumptionPoint> {
    let heat = [61200.0, 38400.0, 22100.0, 19800.0, 21500.0, 44800.0];
    let water = [1320.0, 1410.0, 1525.0, 1580.0, 1490.0, 1360.0];
    MONTHS
        .iter()
        .zip(heat.iter().zip(water.iter()))
        .map(|(month, (kwh, m3))| ConsumptionPoint {
            period: month.to_string(),
            heat_kwh: Some(*kwh),
            water_m3: Some(*m3),
            cost: Some((kwh * 0.112 * 100.0).round() / 100.0),
            extra: Map::new(),
        })
        .collect()
}

pub fn carbon() -> CarbonReport {
    let monthly = [14.2, 9.1, 5.6, 5.0, 5.3, 10.7];
    CarbonReport {
        total_tco2: Some(monthly.iter().sum()),
        reduction_pct: Some(12.4),
        by_source: [
            ("Biomass CHP", 8.3),
            ("Gas peak boiler", 31.6),
            ("Heat pump (grid power)", 6.2),
            ("Solar thermal", 3.8),
        ]
        .into_iter()
        .map(|(source, tonnes)| CarbonSource {
            source: source.to_string(),
            tonnes: Some(tonnes),
        })
        .collect(),
        monthly: MONTHS
            .iter()
            .zip(monthly.iter())
            .map(|(month, tonnes)| CarbonMonth {
                month: month.to_string(),
                tonnes: Some(*tonnes),
            })
            .collect(),
        extra: Map::new(),
    }
}

pub fn goals() -> Vec<Goal> {
    [
        ("g-1", "Reduce network heat loss", "heat_loss", 15.0, 9.5, "%", "2027-06-30"),
        ("g-2", "Cut CO₂ emissions", "co2", 20.0, 12.4, "%", "2027-12-31"),
        ("g-3", "Remote-read every meter", "coverage", 100.0, 87.0, "%", "2026-12-31"),
    ]
    .into_iter()
    .map(|(gid, title, metric, target, current, unit, deadline)| Goal {
        id: id(gid),
        title: title.to_string(),
        metric: text(metric),
        target: Some(target),
        current: Some(current),
        unit: text(unit),
        deadline: text(deadline),
        extra: Map::new(),
    })
    .collect()
}

pub fn manual_entries() -> Vec<ManualEntry> {
    [
        ("e-1", "m-8", 2198.0, "kWh", "2026-10-01", Some("Gateway offline, read on site")),
        ("e-2", "m-7", 398.4, "m³", "2026-10-01", None),
    ]
    .into_iter()
    .map(|(eid, meter, value, unit, read_at, note)| ManualEntry {
        id: id(eid),
        meter_id: id(meter),
        value: Some(value),
        unit: text(unit),
        read_at: text(read_at),
        note: note.map(str::to_string),
        extra: Map::new(),
    })
    .collect()
}

pub fn tenant_profile() -> TenantProfile {
    TenantProfile {
        id: id("tn-1"),
        name: "A. Jansen".to_string(),
        email: text("a.jansen@example.org"),
        unit: text("Apt. 2.04"),
        building: text("Block A, Hafenstraße 12a"),
        contract_number: text("WV-100482"),
        extra: Map::new(),
    }
}

pub fn tenant_consumption() -> Vec<ConsumptionPoint> {
    let heat = [610.0, 380.0, 205.0, 170.0, 190.0, 455.0];
    MONTHS
        .iter()
        .zip(heat.iter())
        .map(|(month, kwh)| ConsumptionPoint {
            period: month.to_string(),
            heat_kwh: Some(*kwh),
            water_m3: Some(4.2),
            cost: Some((kwh * 0.128 * 100.0).round() / 100.0),
            extra: Map::new(),
        })
        .collect()
}

pub fn tenant_invoices() -> Vec<Invoice> {
    [
        ("ti-1", "NK-2026-Q2", "2026-Q2", 148.20, "paid", "2026-07-31"),
        ("ti-2", "NK-2026-Q3", "2026-Q3", 96.75, "open", "2026-10-31"),
    ]
    .into_iter()
    .map(|(iid, number, period, amount, status, due)| Invoice {
        id: id(iid),
        number: text(number),
        customer: text("A. Jansen"),
        period: text(period),
        amount: Some(amount),
        currency: text("EUR"),
        status: text(status),
        due_date: text(due),
        extra: Map::new(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_per_dataset() {
        fn unique<'a>(ids: impl Iterator<Item = &'a RecordId>) -> bool {
            let mut seen = HashSet::new();
            ids.into_iter().all(|id| seen.insert(id.clone()))
        }
        assert!(unique(sites().iter().map(|s| &s.id)));
        assert!(unique(buildings().iter().map(|b| &b.id)));
        assert!(unique(meters().iter().map(|m| &m.id)));
        assert!(unique(gateways().iter().map(|g| &g.id)));
        assert!(unique(goals().iter().map(|g| &g.id)));
    }

    #[test]
    fn buildings_reference_known_sites() {
        let site_ids: HashSet<_> = sites().into_iter().map(|s| s.id).collect();
        assert!(buildings()
            .iter()
            .all(|b| b.site_id.as_ref().is_some_and(|s| site_ids.contains(s))));
    }

    #[test]
    fn readings_end_at_last_value() {
        let readings = meter_readings("m-1");
        assert_eq!(readings.len(), 14);
        assert_eq!(readings.last().and_then(|r| r.value), Some(18234.5));
        assert!(readings.windows(2).all(|w| w[0].value <= w[1].value));
    }

    #[test]
    fn stats_agree_with_datasets() {
        let stats = dashboard_stats();
        assert_eq!(stats.gateways_total, Some(3));
        assert_eq!(stats.gateways_online, Some(2));
        assert_eq!(stats.open_tasks, Some(3));
    }
}
