//! Records exchanged with the metering API
//!
//! The API owns the schema. Records here are deliberately loose: every
//! field the console displays is optional, ids may arrive as strings or
//! numbers, numeric fields may arrive as numeric strings, and anything the
//! console does not know about is kept in `extra` so it round-trips
//! unchanged.

pub mod analytics;
pub mod billing;
pub mod de;
pub mod gateway;
pub mod meter;
pub mod operations;
pub mod site;
pub mod tenant;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

pub use analytics::{CarbonMonth, CarbonReport, CarbonSource, ConsumptionPoint, DashboardStats};
pub use billing::{FinanceMonth, FinanceSummary, Invoice};
pub use gateway::{
    connected_gateway_ids, Gateway, GatewayForm, NewGateway, ReadJob, RemoteAction,
    RemoteCommand, RemoteCommandForm, RemoteStatus,
};
pub use meter::{ManualEntry, ManualEntryForm, Meter, MeterReading, NewManualEntry};
pub use operations::{Goal, GoalForm, MaintenanceTask, NewGoal, NewTask, TaskForm};
pub use site::{Building, Site};
pub use tenant::{TenantLogin, TenantProfile};

/// Record identifier as sent by the API (string or number)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(Self(s)),
            serde_json::Value::Number(n) => Ok(Self(n.to_string())),
            serde_json::Value::Null => Ok(Self::default()),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number id, got {}",
                other
            ))),
        }
    }
}

/// A record the console lists and can address by id
pub trait Record: Clone {
    /// Short kind name used in events and notices ("goal", "gateway", ...)
    const KIND: &'static str;

    fn id(&self) -> &RecordId;
}

/// A record that can be created from a submitted draft.
///
/// When the API answers a create with something other than the full
/// record, the console builds the record from the draft and whatever id
/// the API returned.
pub trait Creatable: Record + DeserializeOwned {
    type Draft: Serialize + Send + Sync;

    fn from_draft(draft: &Self::Draft, id: RecordId) -> Self;
}

/// Rejected form input; never reaches the API
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be a number")]
    NotANumber { field: &'static str },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Trimmed required text field
pub(crate) fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Missing(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Trimmed optional text field (empty → None)
pub(crate) fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Required number within an inclusive range
pub(crate) fn number_in(
    value: &str,
    field: &'static str,
    min: f64,
    max: f64,
) -> Result<f64, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    let n: f64 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| ValidationError::NotANumber { field })?;
    if !n.is_finite() || n < min || n > max {
        return Err(ValidationError::OutOfRange { field, min, max });
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_accepts_strings_and_numbers() {
        let ids: Vec<RecordId> = serde_json::from_str(r#"["a-1", 42, null]"#).unwrap();
        assert_eq!(ids[0].as_str(), "a-1");
        assert_eq!(ids[1].as_str(), "42");
        assert!(ids[2].is_empty());
    }

    #[test]
    fn record_id_rejects_objects() {
        assert!(serde_json::from_str::<RecordId>(r#"{"id": 1}"#).is_err());
    }

    #[test]
    fn number_parsing_accepts_decimal_comma() {
        assert_eq!(number_in("12,5", "value", 0.0, 100.0), Ok(12.5));
        assert_eq!(
            number_in("abc", "value", 0.0, 100.0),
            Err(ValidationError::NotANumber { field: "value" })
        );
        assert_eq!(
            number_in(" ", "value", 0.0, 100.0),
            Err(ValidationError::Missing("value"))
        );
        assert!(matches!(
            number_in("101", "value", 0.0, 100.0),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn optional_trims_to_none() {
        assert_eq!(optional("   "), None);
        assert_eq!(optional(" x "), Some("x".to_string()));
    }
}
