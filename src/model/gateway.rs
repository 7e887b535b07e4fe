//! M-Bus gateways, read jobs and remote control

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de::{opt_bool, opt_count, opt_string, string_or_empty};
use super::{number_in, optional, required, Creatable, Record, RecordId, ValidationError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gateway {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "opt_string",
        alias = "ip",
        alias = "ip_address"
    )]
    pub host: Option<String>,
    #[serde(default, deserialize_with = "opt_count")]
    pub port: Option<u32>,
    #[serde(default)]
    pub site_id: Option<RecordId>,
    #[serde(default, deserialize_with = "opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "opt_bool", alias = "connected")]
    pub online: Option<bool>,
    #[serde(default, deserialize_with = "opt_string")]
    pub last_seen: Option<String>,
    #[serde(default, deserialize_with = "opt_string", alias = "firmware_version")]
    pub firmware: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Gateway {
    /// Explicit online flag wins; otherwise infer from the status text
    pub fn is_online(&self) -> bool {
        self.online.unwrap_or_else(|| {
            matches!(
                self.status
                    .as_deref()
                    .map(|s| s.to_ascii_lowercase())
                    .as_deref(),
                Some("online" | "connected" | "ok" | "active")
            )
        })
    }

    pub fn endpoint(&self) -> String {
        match (&self.host, self.port) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.clone(),
            _ => "-".to_string(),
        }
    }
}

impl Record for Gateway {
    const KIND: &'static str = "gateway";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGateway {
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
}

impl Creatable for Gateway {
    type Draft = NewGateway;

    fn from_draft(draft: &NewGateway, id: RecordId) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            host: Some(draft.host.clone()),
            port: Some(u32::from(draft.port)),
            site_id: draft.site_id.clone().map(RecordId::from),
            status: Some("pending".to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub site_id: String,
}

/// Default TCP port of transparent M-Bus gateways
pub const DEFAULT_GATEWAY_PORT: u16 = 10001;

impl TryFrom<GatewayForm> for NewGateway {
    type Error = ValidationError;

    fn try_from(form: GatewayForm) -> Result<Self, Self::Error> {
        let name = required(&form.name, "name")?;
        let host = required(&form.host, "host")?;
        if host.contains(char::is_whitespace) || host.contains('/') {
            return Err(ValidationError::Invalid {
                field: "host",
                reason: "expected a hostname or IP address".to_string(),
            });
        }
        let port = match optional(&form.port) {
            Some(port) => number_in(&port, "port", 1.0, 65535.0)? as u16,
            None => DEFAULT_GATEWAY_PORT,
        };
        Ok(Self {
            name,
            host,
            port,
            site_id: optional(&form.site_id),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadJob {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub gateway_id: Option<RecordId>,
    #[serde(default, deserialize_with = "opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub started_at: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub finished_at: Option<String>,
    #[serde(default, deserialize_with = "opt_count")]
    pub meters_read: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteStatus {
    #[serde(default)]
    pub gateway_id: RecordId,
    #[serde(default, deserialize_with = "opt_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "opt_count", alias = "baud")]
    pub baud_rate: Option<u32>,
    #[serde(default, deserialize_with = "opt_string")]
    pub last_command: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub last_response: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Commands the gateway firmware understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteAction {
    Ping,
    ReadAll,
    ReadMeter,
    Scan,
    SetBaud,
    Reset,
}

impl RemoteAction {
    pub const ALL: [RemoteAction; 6] = [
        RemoteAction::Ping,
        RemoteAction::ReadAll,
        RemoteAction::ReadMeter,
        RemoteAction::Scan,
        RemoteAction::SetBaud,
        RemoteAction::Reset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteAction::Ping => "ping",
            RemoteAction::ReadAll => "read_all",
            RemoteAction::ReadMeter => "read_meter",
            RemoteAction::Scan => "scan",
            RemoteAction::SetBaud => "set_baud",
            RemoteAction::Reset => "reset",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RemoteAction::Ping => "Ping gateway",
            RemoteAction::ReadAll => "Read all meters",
            RemoteAction::ReadMeter => "Read single meter",
            RemoteAction::Scan => "Scan primary addresses",
            RemoteAction::SetBaud => "Set baud rate",
            RemoteAction::Reset => "Reset gateway",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == value)
    }
}

/// Standard M-Bus baud rates
pub const BAUD_RATES: [u32; 3] = [300, 2400, 9600];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteCommand {
    pub command: RemoteAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baud_rate: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteCommandForm {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub baud_rate: String,
}

impl TryFrom<RemoteCommandForm> for RemoteCommand {
    type Error = ValidationError;

    fn try_from(form: RemoteCommandForm) -> Result<Self, Self::Error> {
        let command = RemoteAction::parse(form.command.trim()).ok_or_else(|| {
            ValidationError::Invalid {
                field: "command",
                reason: format!("unknown command '{}'", form.command.trim()),
            }
        })?;

        let address = match command {
            // M-Bus primary address range
            RemoteAction::ReadMeter => Some(number_in(&form.address, "address", 0.0, 250.0)? as u8),
            _ => None,
        };

        let baud_rate = match command {
            RemoteAction::SetBaud => {
                let baud = number_in(&form.baud_rate, "baud rate", 300.0, 9600.0)? as u32;
                if !BAUD_RATES.contains(&baud) {
                    return Err(ValidationError::Invalid {
                        field: "baud rate",
                        reason: "expected 300, 2400 or 9600".to_string(),
                    });
                }
                Some(baud)
            }
            _ => None,
        };

        Ok(Self {
            command,
            address,
            baud_rate,
        })
    }
}

/// Ids from the connected-gateways endpoint.
///
/// The endpoint has been seen returning bare ids, numbers, and objects
/// with `id` or `gateway_id`; all are accepted.
pub fn connected_gateway_ids(body: &Value) -> Vec<String> {
    let items = match body {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match ["gateways", "connected", "data"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
        {
            Some(items) => items.as_slice(),
            None => &[],
        },
        _ => &[],
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Object(obj) => obj
                .get("id")
                .or_else(|| obj.get("gateway_id"))
                .and_then(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                }),
            _ => None,
        })
        .collect()
}
