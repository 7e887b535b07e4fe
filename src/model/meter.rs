//! Meters, readings and manual reading entry

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de::{opt_count, opt_number, opt_string};
use super::{number_in, optional, required, Creatable, Record, RecordId, ValidationError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meter {
    #[serde(default)]
    pub id: RecordId,
    #[serde(
        default,
        deserialize_with = "opt_string",
        alias = "serial_number",
        alias = "meter_number"
    )]
    pub serial: Option<String>,
    /// heat, water, electricity, ...
    #[serde(default, deserialize_with = "opt_string", alias = "type")]
    pub medium: Option<String>,
    #[serde(default)]
    pub site_id: Option<RecordId>,
    #[serde(default)]
    pub building_id: Option<RecordId>,
    #[serde(default)]
    pub gateway_id: Option<RecordId>,
    #[serde(default, deserialize_with = "opt_count")]
    pub primary_address: Option<u32>,
    #[serde(default, deserialize_with = "opt_number", alias = "last_reading")]
    pub last_value: Option<f64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub last_read_at: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Meter {
    /// Serial when known, id otherwise
    pub fn label(&self) -> String {
        self.serial
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

impl Record for Meter {
    const KIND: &'static str = "meter";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    #[serde(default)]
    pub meter_id: RecordId,
    #[serde(default, deserialize_with = "opt_string", alias = "read_at", alias = "ts")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "opt_number", alias = "reading")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub unit: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A manually captured meter reading
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualEntry {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub meter_id: RecordId,
    #[serde(default, deserialize_with = "opt_number")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub read_at: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub note: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for ManualEntry {
    const KIND: &'static str = "manual_entry";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewManualEntry {
    pub meter_id: String,
    pub value: f64,
    pub unit: String,
    pub read_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Creatable for ManualEntry {
    type Draft = NewManualEntry;

    fn from_draft(draft: &NewManualEntry, id: RecordId) -> Self {
        Self {
            id,
            meter_id: RecordId::new(draft.meter_id.clone()),
            value: Some(draft.value),
            unit: Some(draft.unit.clone()),
            read_at: Some(draft.read_at.clone()),
            note: draft.note.clone(),
            extra: Map::new(),
        }
    }
}

/// Manual entry form as posted by the browser
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManualEntryForm {
    #[serde(default)]
    pub meter_id: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub read_at: String,
    #[serde(default)]
    pub note: String,
}

impl TryFrom<ManualEntryForm> for NewManualEntry {
    type Error = ValidationError;

    fn try_from(form: ManualEntryForm) -> Result<Self, Self::Error> {
        let meter_id = required(&form.meter_id, "meter")?;
        let value = number_in(&form.value, "value", 0.0, 1.0e12)?;
        let read_at = match optional(&form.read_at) {
            Some(date) => {
                NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| {
                    ValidationError::Invalid {
                        field: "date",
                        reason: "expected YYYY-MM-DD".to_string(),
                    }
                })?;
                date
            }
            None => Utc::now().date_naive().format("%Y-%m-%d").to_string(),
        };
        Ok(Self {
            meter_id,
            value,
            unit: optional(&form.unit).unwrap_or_else(|| "kWh".to_string()),
            read_at,
            note: optional(&form.note),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_aliases() {
        let meter: Meter = serde_json::from_str(
            r#"{"id": 9, "serial_number": 12345678, "type": "heat", "last_reading": "1520.4"}"#,
        )
        .unwrap();
        assert_eq!(meter.serial.as_deref(), Some("12345678"));
        assert_eq!(meter.medium.as_deref(), Some("heat"));
        assert_eq!(meter.last_value, Some(1520.4));
        assert_eq!(meter.label(), "12345678");
    }

    #[test]
    fn manual_entry_form_validation() {
        let form = ManualEntryForm {
            meter_id: "m-1".into(),
            value: "123.4".into(),
            unit: "".into(),
            read_at: "2026-03-01".into(),
            note: " ".into(),
        };
        let draft = NewManualEntry::try_from(form).unwrap();
        assert_eq!(draft.unit, "kWh");
        assert_eq!(draft.note, None);
        assert_eq!(draft.read_at, "2026-03-01");

        let missing_meter = ManualEntryForm {
            value: "1".into(),
            ..Default::default()
        };
        assert_eq!(
            NewManualEntry::try_from(missing_meter),
            Err(ValidationError::Missing("meter"))
        );

        let bad_date = ManualEntryForm {
            meter_id: "m-1".into(),
            value: "1".into(),
            read_at: "01.03.2026".into(),
            ..Default::default()
        };
        assert!(matches!(
            NewManualEntry::try_from(bad_date),
            Err(ValidationError::Invalid { field: "date", .. })
        ));
    }

    #[test]
    fn negative_reading_rejected() {
        let form = ManualEntryForm {
            meter_id: "m-1".into(),
            value: "-5".into(),
            ..Default::default()
        };
        assert!(matches!(
            NewManualEntry::try_from(form),
            Err(ValidationError::OutOfRange { field: "value", .. })
        ));
    }
}
