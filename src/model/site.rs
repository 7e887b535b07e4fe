//! Sites and buildings

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de::{opt_count, opt_number, opt_string, string_or_empty};
use super::{Record, RecordId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, deserialize_with = "string_or_empty", alias = "site_name")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "opt_count", alias = "buildings")]
    pub building_count: Option<u32>,
    #[serde(default, deserialize_with = "opt_count", alias = "meters")]
    pub meter_count: Option<u32>,
    #[serde(default, deserialize_with = "opt_string")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Site {
    const KIND: &'static str = "site";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Building {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub site_id: Option<RecordId>,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "opt_number", alias = "area_m2")]
    pub heated_area_m2: Option<f64>,
    #[serde(default, deserialize_with = "opt_count", alias = "unit_count")]
    pub units: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Building {
    const KIND: &'static str = "building";

    fn id(&self) -> &RecordId {
        &self.id
    }
}
