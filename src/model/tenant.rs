//! Tenant portal records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de::{opt_count, opt_string, string_or_empty};
use super::RecordId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantProfile {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, deserialize_with = "string_or_empty", alias = "full_name")]
    pub name: String,
    #[serde(default, deserialize_with = "opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "opt_string", alias = "apartment")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "opt_string", alias = "building_name")]
    pub building: Option<String>,
    #[serde(default, deserialize_with = "opt_string", alias = "contract")]
    pub contract_number: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of the tenant login endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TenantLogin {
    #[serde(alias = "access_token")]
    pub token: String,
    #[serde(default, deserialize_with = "opt_count")]
    pub expires_in: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_accepts_access_token_alias() {
        let login: TenantLogin =
            serde_json::from_str(r#"{"access_token": "abc", "expires_in": 600}"#).unwrap();
        assert_eq!(login.token, "abc");
        assert_eq!(login.expires_in, Some(600));

        assert!(serde_json::from_str::<TenantLogin>(r#"{"ok": true}"#).is_err());
    }
}
