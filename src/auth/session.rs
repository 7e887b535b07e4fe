//! In-memory session stores with expiry
//!
//! The raw token only ever lives in the browser cookie. The store keys on
//! its SHA-256, so a dump of the map cannot be replayed.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::AuthError;

/// Console operator session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    #[serde(skip)]
    pub id_hash: String,
    pub username: String,
    pub role: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Granted offline with the configured demo credentials
    pub demo: bool,
}

/// Tenant portal session holding the API bearer token
#[derive(Debug, Clone, PartialEq)]
pub struct TenantSession {
    pub id_hash: String,
    pub bearer: String,
    pub email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub demo: bool,
}

pub trait Expiring: Clone + Send + Sync + 'static {
    fn expires_at(&self) -> DateTime<Utc>;

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

impl Expiring for Session {
    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl Expiring for TenantSession {
    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Random 256-bit token, hex encoded
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[derive(Clone)]
pub struct SessionStore<S> {
    sessions: Arc<RwLock<HashMap<String, S>>>,
    ttl: Duration,
}

pub type ConsoleSessions = SessionStore<Session>;
pub type TenantSessions = SessionStore<TenantSession>;

impl<S: Expiring> SessionStore<S> {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(ttl_secs.clamp(1, i64::MAX as u64 / 1000) as i64),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    async fn insert_with(
        &self,
        now: DateTime<Utc>,
        ttl: Duration,
        build: impl FnOnce(String, DateTime<Utc>, DateTime<Utc>) -> S,
    ) -> (String, S) {
        let token = generate_token();
        let session = build(hash_token(&token), now, now + ttl);
        self.sessions
            .write()
            .await
            .insert(hash_token(&token), session.clone());
        (token, session)
    }

    /// Session for `token` if it exists and has not expired.
    ///
    /// Expired sessions are evicted on the spot.
    pub async fn validate(&self, token: &str) -> Result<S, AuthError> {
        self.validate_at(token, Utc::now()).await
    }

    pub(crate) async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<S, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Missing);
        }
        let key = hash_token(token);
        {
            let sessions = self.sessions.read().await;
            match sessions.get(&key) {
                None => return Err(AuthError::Unknown),
                Some(session) if !session.is_expired_at(now) => return Ok(session.clone()),
                Some(_) => {}
            }
        }
        let mut sessions = self.sessions.write().await;
        // Re-check under the write lock; the entry may have been replaced
        match sessions.get(&key) {
            Some(session) if session.is_expired_at(now) => {
                sessions.remove(&key);
                debug!("evicted expired session");
                Err(AuthError::Expired)
            }
            Some(session) => Ok(session.clone()),
            None => Err(AuthError::Unknown),
        }
    }

    pub async fn revoke(&self, token: &str) -> Option<S> {
        self.sessions.write().await.remove(&hash_token(token))
    }

    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now()).await
    }

    pub(crate) async fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl SessionStore<Session> {
    pub async fn create(&self, username: &str, role: &str, demo: bool) -> (String, Session) {
        self.create_at(username, role, demo, Utc::now()).await
    }

    pub(crate) async fn create_at(
        &self,
        username: &str,
        role: &str,
        demo: bool,
        now: DateTime<Utc>,
    ) -> (String, Session) {
        self.insert_with(now, self.ttl, |id_hash, issued_at, expires_at| Session {
            id_hash,
            username: username.to_string(),
            role: role.to_string(),
            issued_at,
            expires_at,
            demo,
        })
        .await
    }
}

impl SessionStore<TenantSession> {
    /// `expires_in` from the API shortens the configured ttl, never extends it
    pub async fn create(
        &self,
        email: &str,
        bearer: &str,
        expires_in: Option<u32>,
        demo: bool,
    ) -> (String, TenantSession) {
        let ttl = expires_in
            .map(|secs| Duration::seconds(i64::from(secs.max(1))).min(self.ttl))
            .unwrap_or(self.ttl);
        self.insert_with(Utc::now(), ttl, |id_hash, issued_at, expires_at| TenantSession {
            id_hash,
            bearer: bearer.to_string(),
            email: email.to_string(),
            issued_at,
            expires_at,
            demo,
        })
        .await
    }
}
