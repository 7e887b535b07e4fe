//! HTTP client for the metering API

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::envelope::{created_id, list_items, record_body};
use super::error::{server_message, ApiError};
use super::Loaded;
use crate::config::ApiConfig;
use crate::model::{Creatable, RecordId};

/// Ids for records the API created without telling us their id
static LOCAL_IDS: AtomicU64 = AtomicU64::new(1);

fn local_id() -> RecordId {
    RecordId::new(format!("local-{}", LOCAL_IDS.fetch_add(1, Ordering::Relaxed)))
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Arc<str>,
    bearer: Option<Arc<str>>,
    demo_fallback: bool,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let parsed =
            url::Url::parse(&config.base_url).map_err(|e| ApiError::BaseUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::BaseUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(concat!("heatnet-console/", env!("HNC_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            bearer: None,
            demo_fallback: true,
        })
    }

    /// Whether failed loads fall back to demo data
    pub fn with_demo_fallback(mut self, enabled: bool) -> Self {
        self.demo_fallback = enabled;
        self
    }

    /// Clone that authenticates every request with `token`
    pub fn with_bearer(&self, token: &str) -> Self {
        Self {
            bearer: Some(Arc::from(token)),
            ..self.clone()
        }
    }

    pub fn demo_fallback(&self) -> bool {
        self.demo_fallback
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let request = self.http.request(method, self.url(path));
        match &self.bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(path, "GET");
        let response = self.request(reqwest::Method::GET, path).send().await?;
        let body = json_body(response).await?;
        serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// A list endpoint, bare array or wrapped
    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let body: Value = self.get_json(path).await?;
        serde_json::from_value(Value::Array(list_items(body)))
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// A single record, bare or wrapped
    pub async fn get_record<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body: Value = self.get_json(path).await?;
        serde_json::from_value(record_body(&body).clone())
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn load<T: DeserializeOwned>(&self, path: &str, demo: impl FnOnce() -> T) -> Loaded<T> {
        self.settle(path, self.get_json(path).await, demo)
    }

    pub async fn load_record<T: DeserializeOwned>(
        &self,
        path: &str,
        demo: impl FnOnce() -> T,
    ) -> Loaded<T> {
        self.settle(path, self.get_record(path).await, demo)
    }

    pub async fn load_list<T: DeserializeOwned>(
        &self,
        path: &str,
        demo: impl FnOnce() -> Vec<T>,
    ) -> Loaded<Vec<T>> {
        self.settle(path, self.get_list(path).await, demo)
    }

    fn settle<T>(
        &self,
        path: &str,
        result: Result<T, ApiError>,
        demo: impl FnOnce() -> T,
    ) -> Loaded<T> {
        if let Err(e) = &result {
            warn!(path, error = %e, demo = self.demo_fallback, "load failed");
        }
        Loaded::resolve(result, self.demo_fallback, demo)
    }

    /// POST a draft and return the created record
    pub async fn create<T: Creatable>(&self, path: &str, draft: &T::Draft) -> Result<T, ApiError> {
        let body = self.post(path, draft).await?;
        let created = body.as_ref().and_then(|body| {
            serde_json::from_value::<T>(record_body(body).clone())
                .ok()
                .filter(|record| !record.id().is_empty())
        });
        Ok(match created {
            Some(record) => record,
            None => {
                let id = body.as_ref().and_then(created_id).unwrap_or_else(local_id);
                T::from_draft(draft, id)
            }
        })
    }

    /// POST with a JSON body; a successful response without JSON is `None`
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<Value>, ApiError> {
        debug!(path, "POST");
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        let response = check_status(response).await?;
        if !is_json(response.headers().get(CONTENT_TYPE)) {
            return Ok(None);
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes).ok())
    }

    /// POST expecting a JSON answer
    pub async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        debug!(path, "POST");
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        let body = json_body(response).await?;
        serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        debug!(path, "DELETE");
        let response = self.request(reqwest::Method::DELETE, path).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

fn is_json(content_type: Option<&HeaderValue>) -> bool {
    content_type
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let essence = v.split(';').next().unwrap_or_default().trim();
            essence.eq_ignore_ascii_case("application/json") || essence.ends_with("+json")
        })
        .unwrap_or(false)
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: server_message(&body),
    })
}

async fn json_body(response: Response) -> Result<Value, ApiError> {
    let response = check_status(response).await?;
    let content_type = response.headers().get(CONTENT_TYPE).cloned();
    if !is_json(content_type.as_ref()) {
        return Err(ApiError::NotJson {
            content_type: content_type
                .and_then(|v| v.to_str().ok().map(str::to_string))
                .unwrap_or_default(),
        });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}
