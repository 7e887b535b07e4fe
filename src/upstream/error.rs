use thiserror::Error;

/// Everything that can go wrong talking to the metering API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}{}", .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    Status { status: u16, message: Option<String> },

    #[error("expected JSON, got '{content_type}'")]
    NotJson { content_type: String },

    #[error("undecodable body: {0}")]
    Decode(String),

    #[error("invalid API base URL: {0}")]
    BaseUrl(String),
}

impl ApiError {
    /// Text shown to the operator in an error notice
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Status {
                status,
                message: None,
            } => format!("Request failed (HTTP {})", status),
            ApiError::Transport(_) => "Could not reach the metering API".to_string(),
            ApiError::NotJson { .. } | ApiError::Decode(_) => {
                "The metering API returned an unexpected response".to_string()
            }
            ApiError::BaseUrl(_) => {
                "The metering API address is not configured correctly".to_string()
            }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// The API is down or is not the API (proxy error pages, captive portals)
    pub fn is_unavailable(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::NotJson { .. } | ApiError::BaseUrl(_) => true,
            ApiError::Status { status, .. } => *status >= 502,
            ApiError::Decode(_) => false,
        }
    }
}

/// Pull a human-readable message out of an error body
pub(crate) fn server_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    ["message", "error", "detail"].iter().find_map(|key| {
        value
            .get(*key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_wins() {
        let err = ApiError::Status {
            status: 422,
            message: server_message(br#"{"message": "Serial already registered"}"#),
        };
        assert_eq!(err.user_message(), "Serial already registered");
        assert_eq!(err.to_string(), "HTTP 422: Serial already registered");
    }

    #[test]
    fn generic_fallback_without_message() {
        let err = ApiError::Status {
            status: 502,
            message: server_message(b"<html>Bad Gateway</html>"),
        };
        assert_eq!(err.user_message(), "Request failed (HTTP 502)");
        assert!(err.is_unavailable());
    }

    #[test]
    fn message_keys_in_order() {
        assert_eq!(
            server_message(br#"{"detail": "d", "error": "e"}"#).as_deref(),
            Some("e")
        );
        assert_eq!(server_message(br#"{"message": "  "}"#), None);
        assert_eq!(server_message(br#"{"error": {"code": 1}}"#), None);
    }

    #[test]
    fn unauthorized_detection() {
        let err = ApiError::Status {
            status: 401,
            message: None,
        };
        assert!(err.is_unauthorized());
        assert!(!err.is_unavailable());
        assert!(!ApiError::Decode("x".into()).is_unauthorized());
    }
}
