//! Mock metering API
//!
//! Every request is recorded. Responses are looked up by method and
//! path-with-query first, then by method and bare path; anything else
//! answers 404 with a JSON message.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// A canned response
#[derive(Debug, Clone)]
struct Reply {
    status: StatusCode,
    content_type: &'static str,
    body: String,
}

/// A request the mock received
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct MockState {
    replies: HashMap<String, Reply>,
    requests: Vec<Recorded>,
}

fn key(method: &str, path: &str) -> String {
    format!("{} {}", method.to_ascii_uppercase(), path)
}

pub struct MockMeteringApi {
    addr: SocketAddr,
    state: Arc<RwLock<MockState>>,
    handle: JoinHandle<()>,
}

impl MockMeteringApi {
    /// Start the mock on a random port
    pub async fn start() -> Self {
        let state = Arc::new(RwLock::new(MockState::default()));

        let app = Router::new()
            .fallback(handle_request)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer `method path` with a JSON body
    pub async fn reply_json(&self, method: &str, path: &str, status: u16, body: Value) {
        self.insert(method, path, status, "application/json", body.to_string())
            .await;
    }

    /// Answer `method path` with an HTML body, as a misrouted proxy would
    pub async fn reply_html(&self, method: &str, path: &str, status: u16, html: &str) {
        self.insert(method, path, status, "text/html; charset=utf-8", html.to_string())
            .await;
    }

    async fn insert(
        &self,
        method: &str,
        path: &str,
        status: u16,
        content_type: &'static str,
        body: String,
    ) {
        let reply = Reply {
            status: StatusCode::from_u16(status).unwrap(),
            content_type,
            body,
        };
        self.state
            .write()
            .await
            .replies
            .insert(key(method, path), reply);
    }

    /// Requests received so far, oldest first
    pub async fn requests(&self) -> Vec<Recorded> {
        self.state.read().await.requests.clone()
    }

    /// How many times `method path` was requested
    pub async fn hits(&self, method: &str, path: &str) -> usize {
        self.state
            .read()
            .await
            .requests
            .iter()
            .filter(|r| r.method.eq_ignore_ascii_case(method) && r.path == path)
            .count()
    }

    pub async fn stop(self) {
        self.handle.abort();
    }
}

/// Base URL of a port nothing listens on
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn handle_request(
    State(state): State<Arc<RwLock<MockState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let full_path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let mut state = state.write().await;
    state.requests.push(Recorded {
        method: method.to_string(),
        path: full_path.clone(),
        bearer,
        body: serde_json::from_slice(&body).ok(),
    });

    let reply = state
        .replies
        .get(&key(method.as_str(), &full_path))
        .or_else(|| state.replies.get(&key(method.as_str(), uri.path())))
        .cloned();

    match reply {
        Some(reply) => (
            reply.status,
            [(CONTENT_TYPE, reply.content_type)],
            reply.body,
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "message": format!("no route for {}", full_path) })),
        )
            .into_response(),
    }
}
