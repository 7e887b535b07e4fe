//! Live M-Bus reader sessions
//!
//! One session per gateway, driven by the operator's buttons:
//!
//! ```text
//! Disconnected --Connect--> Connecting --Established--> Connected
//!                           Connecting --Fail---------> Disconnected
//! Connected | Stopped --Start--> Reading --Stop--> Stopped
//! Connected | Reading | Stopped --Disconnect--> Disconnected
//! ```
//!
//! While reading, a poll loop owned by a [`PollGuard`] fetches readings
//! from the API (live feed) or fabricates them (simulated feed, used when the
//! gateway is not TCP-connected upstream). Readings are committed under the
//! session lock and only while the loop's token is still live, so once
//! `stop` or `disconnect` returns no further reading becomes visible.
//!
//! Only `connect` creates a session; `disconnect` and a failed connect drop
//! it. A reading session whose state nobody has asked for in
//! [`IDLE_POLLS`] poll periods stops itself, so a closed tab does not keep
//! the upstream busy.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::guard::PollGuard;
use crate::bus::{BusEvent, SharedBus};
use crate::model::{connected_gateway_ids, MeterReading, RecordId};
use crate::upstream::ApiClient;

/// Readings kept per session for the page table
const MAX_READINGS: usize = 60;

/// Poll periods without a state request before a reading session stops
pub const IDLE_POLLS: u32 = 12;

const CONNECTED_PATH: &str = "/api/mbus/connected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reading,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderAction {
    Connect,
    Established,
    Fail,
    Start,
    Stop,
    Disconnect,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action:?} while {from}")]
pub struct TransitionError {
    pub from: ReaderState,
    pub action: ReaderAction,
}

impl ReaderState {
    pub fn apply(self, action: ReaderAction) -> Result<ReaderState, TransitionError> {
        use ReaderAction::*;
        use ReaderState::*;
        match (self, action) {
            (Disconnected, Connect) => Ok(Connecting),
            (Connecting, Established) => Ok(Connected),
            (Connecting, Fail) => Ok(Disconnected),
            (Connected | Stopped, Start) => Ok(Reading),
            (Reading, Stop) => Ok(Stopped),
            (Connected | Reading | Stopped, Disconnect) => Ok(Disconnected),
            (from, action) => Err(TransitionError { from, action }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReaderState::Disconnected => "disconnected",
            ReaderState::Connecting => "connecting",
            ReaderState::Connected => "connected",
            ReaderState::Reading => "reading",
            ReaderState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for ReaderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where readings come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    Live,
    Simulated,
}

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("gateway {0} is not connected and demo fallback is disabled")]
    Unavailable(String),
}

/// Fabricates heat-energy readings for three synthetic meters.
///
/// Totals only ever grow, like a real energy register.
#[derive(Debug, Clone)]
pub struct Simulator {
    totals: [f64; 3],
}

impl Default for Simulator {
    fn default() -> Self {
        Self {
            totals: [18_234.5, 9_021.7, 2_210.0],
        }
    }
}

impl Simulator {
    pub const METERS: [&'static str; 3] = ["SIM-0001", "SIM-0002", "SIM-0003"];

    pub fn next(&mut self, now: DateTime<Utc>) -> Vec<MeterReading> {
        let mut rng = rand::thread_rng();
        Self::METERS
            .iter()
            .zip(self.totals.iter_mut())
            .map(|(meter, total)| {
                *total += rng.gen_range(0.1..1.5);
                MeterReading {
                    meter_id: RecordId::from(*meter),
                    timestamp: Some(now.to_rfc3339()),
                    value: Some((*total * 10.0).round() / 10.0),
                    unit: Some("kWh".to_string()),
                    extra: Default::default(),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReaderSnapshot {
    pub gateway_id: String,
    pub state: ReaderState,
    pub mode: Option<FeedMode>,
    /// Newest first
    pub readings: Vec<MeterReading>,
    pub polls: u64,
    pub last_error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReaderSnapshot {
    fn disconnected(gateway_id: &str) -> Self {
        Self {
            gateway_id: gateway_id.to_string(),
            state: ReaderState::Disconnected,
            mode: None,
            readings: Vec::new(),
            polls: 0,
            last_error: None,
            updated_at: None,
        }
    }
}

struct ReaderSession {
    state: ReaderState,
    mode: Option<FeedMode>,
    readings: VecDeque<MeterReading>,
    polls: u64,
    last_error: Option<String>,
    updated_at: Option<DateTime<Utc>>,
    simulator: Simulator,
    guard: Option<PollGuard>,
    last_seen: Instant,
}

impl ReaderSession {
    fn new() -> Self {
        Self {
            state: ReaderState::default(),
            mode: None,
            readings: VecDeque::new(),
            polls: 0,
            last_error: None,
            updated_at: None,
            simulator: Simulator::default(),
            guard: None,
            last_seen: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    fn snapshot(&self, gateway_id: &str) -> ReaderSnapshot {
        ReaderSnapshot {
            gateway_id: gateway_id.to_string(),
            state: self.state,
            mode: self.mode,
            readings: self.readings.iter().cloned().collect(),
            polls: self.polls,
            last_error: self.last_error.clone(),
            updated_at: self.updated_at,
        }
    }

    fn commit(&mut self, readings: Vec<MeterReading>) {
        for reading in readings {
            self.readings.push_front(reading);
        }
        self.readings.truncate(MAX_READINGS);
        self.polls += 1;
        self.last_error = None;
        self.updated_at = Some(Utc::now());
    }

    fn halt(&mut self) {
        if let Some(guard) = self.guard.take() {
            guard.cancel();
        }
    }
}

type SessionRef = Arc<Mutex<ReaderSession>>;

#[derive(Clone)]
pub struct LiveReaderRegistry {
    api: ApiClient,
    bus: SharedBus,
    interval: Duration,
    demo_fallback: bool,
    sessions: Arc<Mutex<HashMap<String, SessionRef>>>,
    shutdown: CancellationToken,
}

impl LiveReaderRegistry {
    pub fn new(api: ApiClient, bus: SharedBus, interval: Duration) -> Self {
        let demo_fallback = api.demo_fallback();
        Self {
            api,
            bus,
            interval,
            demo_fallback,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            shutdown: CancellationToken::new(),
        }
    }

    /// Create the session for `gateway_id` if needed, pruning stale ones
    async fn open(&self, gateway_id: &str) -> SessionRef {
        let mut sessions = self.sessions.lock().await;
        let limit = self.interval * IDLE_POLLS;
        // Busy sessions are skipped; the session lock is taken before the map lock elsewhere
        sessions.retain(|id, session| match session.try_lock() {
            Ok(s) if s.state != ReaderState::Reading && s.last_seen.elapsed() > limit => {
                debug!(gateway_id = %id, "dropping idle reader session");
                false
            }
            _ => true,
        });
        sessions
            .entry(gateway_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ReaderSession::new())))
            .clone()
    }

    /// An existing session; a missing one counts as disconnected
    async fn existing(
        &self,
        gateway_id: &str,
        action: ReaderAction,
    ) -> Result<SessionRef, TransitionError> {
        self.sessions
            .lock()
            .await
            .get(gateway_id)
            .cloned()
            .ok_or(TransitionError {
                from: ReaderState::Disconnected,
                action,
            })
    }

    /// Drop the map entry if it still points at `session`
    async fn forget(&self, gateway_id: &str, session: &SessionRef) {
        let mut sessions = self.sessions.lock().await;
        if sessions
            .get(gateway_id)
            .is_some_and(|current| Arc::ptr_eq(current, session))
        {
            sessions.remove(gateway_id);
        }
    }

    /// Number of gateways with a session
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn publish_state(&self, gateway_id: &str, state: ReaderState) {
        self.bus.publish(BusEvent::ReaderStateChanged {
            gateway_id: gateway_id.to_string(),
            state: state.as_str().to_string(),
        });
    }

    fn transition(
        &self,
        gateway_id: &str,
        session: &mut ReaderSession,
        action: ReaderAction,
    ) -> Result<ReaderState, TransitionError> {
        let next = session.state.apply(action)?;
        debug!(gateway_id, from = %session.state, to = %next, "reader transition");
        session.state = next;
        self.publish_state(gateway_id, next);
        Ok(next)
    }

    /// Whether the API lists `gateway_id` as TCP-connected
    async fn is_listed(&self, gateway_id: &str) -> Result<bool, String> {
        match self.api.get_json::<Value>(CONNECTED_PATH).await {
            Ok(body) => Ok(connected_gateway_ids(&body).iter().any(|id| id == gateway_id)),
            Err(e) => Err(e.user_message()),
        }
    }

    pub async fn connect(&self, gateway_id: &str) -> Result<ReaderSnapshot, ReaderError> {
        let session = self.open(gateway_id).await;
        {
            let mut s = session.lock().await;
            s.touch();
            self.transition(gateway_id, &mut s, ReaderAction::Connect)?;
        }

        let listed = self.is_listed(gateway_id).await;
        let mode = match &listed {
            Ok(true) => Some(FeedMode::Live),
            _ if self.demo_fallback => Some(FeedMode::Simulated),
            _ => None,
        };

        let mut s = session.lock().await;
        if s.state != ReaderState::Connecting {
            // Disconnected while checking
            return Ok(s.snapshot(gateway_id));
        }
        match mode {
            Some(mode) => {
                s.mode = Some(mode);
                s.last_error = listed.err();
                self.transition(gateway_id, &mut s, ReaderAction::Established)?;
                info!(gateway_id, ?mode, "reader connected");
                Ok(s.snapshot(gateway_id))
            }
            None => {
                s.last_error = Some(match listed {
                    Err(message) => message,
                    Ok(_) => format!("Gateway {} is not connected", gateway_id),
                });
                self.transition(gateway_id, &mut s, ReaderAction::Fail)?;
                self.forget(gateway_id, &session).await;
                warn!(gateway_id, error = ?s.last_error, "reader connect failed");
                Err(ReaderError::Unavailable(gateway_id.to_string()))
            }
        }
    }

    pub async fn start(&self, gateway_id: &str) -> Result<ReaderSnapshot, ReaderError> {
        let session = self.existing(gateway_id, ReaderAction::Start).await?;
        let mut s = session.lock().await;
        self.transition(gateway_id, &mut s, ReaderAction::Start)?;
        s.touch();

        let mode = s.mode.unwrap_or(FeedMode::Simulated);
        let weak = Arc::downgrade(&session);
        let api = self.api.clone();
        let bus = self.bus.clone();
        let period = self.interval;
        let gw = gateway_id.to_string();
        // Replacing the guard cancels any loop left over from a previous run
        s.guard = Some(PollGuard::spawn(&self.shutdown, move |token| {
            poll_loop(weak, api, bus, gw, mode, period, token)
        }));
        info!(gateway_id, ?mode, "reader started");
        Ok(s.snapshot(gateway_id))
    }

    pub async fn stop(&self, gateway_id: &str) -> Result<ReaderSnapshot, ReaderError> {
        let session = self.existing(gateway_id, ReaderAction::Stop).await?;
        let mut s = session.lock().await;
        self.transition(gateway_id, &mut s, ReaderAction::Stop)?;
        s.touch();
        s.halt();
        info!(gateway_id, "reader stopped");
        Ok(s.snapshot(gateway_id))
    }

    pub async fn disconnect(&self, gateway_id: &str) -> Result<ReaderSnapshot, ReaderError> {
        let session = self.existing(gateway_id, ReaderAction::Disconnect).await?;
        let mut s = session.lock().await;
        self.transition(gateway_id, &mut s, ReaderAction::Disconnect)?;
        s.halt();
        s.mode = None;
        s.readings.clear();
        self.forget(gateway_id, &session).await;
        info!(gateway_id, "reader disconnected");
        Ok(s.snapshot(gateway_id))
    }

    pub async fn snapshot(&self, gateway_id: &str) -> ReaderSnapshot {
        let session = self.sessions.lock().await.get(gateway_id).cloned();
        match session {
            Some(session) => {
                let mut s = session.lock().await;
                s.touch();
                s.snapshot(gateway_id)
            }
            None => ReaderSnapshot::disconnected(gateway_id),
        }
    }

    /// Gateways with an active poll loop
    pub async fn reading(&self) -> Vec<String> {
        let sessions: Vec<(String, SessionRef)> = self
            .sessions
            .lock()
            .await
            .iter()
            .map(|(id, s)| (id.clone(), s.clone()))
            .collect();
        let mut active = Vec::new();
        for (id, session) in sessions {
            if session.lock().await.state == ReaderState::Reading {
                active.push(id);
            }
        }
        active.sort();
        active
    }

    /// Cancel every loop and forget all sessions
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let sessions: Vec<SessionRef> = self.sessions.lock().await.drain().map(|(_, s)| s).collect();
        for session in sessions {
            session.lock().await.halt();
        }
        info!("live reader registry shut down");
    }
}

async fn poll_loop(
    session: Weak<Mutex<ReaderSession>>,
    api: ApiClient,
    bus: SharedBus,
    gateway_id: String,
    mode: FeedMode,
    period: Duration,
    token: CancellationToken,
) {
    let idle = period * IDLE_POLLS;
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let path = format!("/api/mbus/readings/{}", urlencoding::encode(&gateway_id));

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let fetched = match mode {
                    FeedMode::Live => Some(api.get_list::<MeterReading>(&path).await),
                    FeedMode::Simulated => None,
                };

                let Some(session) = session.upgrade() else { break };
                let mut s = session.lock().await;
                if token.is_cancelled() {
                    break;
                }
                if s.last_seen.elapsed() >= idle {
                    if let Ok(next) = s.state.apply(ReaderAction::Stop) {
                        s.state = next;
                        bus.publish(BusEvent::ReaderStateChanged {
                            gateway_id: gateway_id.clone(),
                            state: next.as_str().to_string(),
                        });
                    }
                    s.halt();
                    info!(gateway_id = %gateway_id, "reader stopped, nobody watching");
                    break;
                }
                let readings = match fetched {
                    None => s.simulator.next(Utc::now()),
                    Some(Ok(readings)) => readings,
                    Some(Err(e)) => {
                        warn!(gateway_id = %gateway_id, error = %e, "reading poll failed");
                        s.last_error = Some(e.user_message());
                        continue;
                    }
                };
                for reading in &readings {
                    bus.publish(BusEvent::LiveReading {
                        gateway_id: gateway_id.clone(),
                        reading: reading.clone(),
                    });
                }
                s.commit(readings);
            }
        }
    }
    debug!(gateway_id = %gateway_id, "reader poll loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReaderAction::*;
    use ReaderState::*;

    #[test]
    fn legal_transitions() {
        assert_eq!(Disconnected.apply(Connect), Ok(Connecting));
        assert_eq!(Connecting.apply(Established), Ok(Connected));
        assert_eq!(Connecting.apply(Fail), Ok(Disconnected));
        assert_eq!(Connected.apply(Start), Ok(Reading));
        assert_eq!(Reading.apply(Stop), Ok(Stopped));
        assert_eq!(Stopped.apply(Start), Ok(Reading));
        for from in [Connected, Reading, Stopped] {
            assert_eq!(from.apply(Disconnect), Ok(Disconnected));
        }
    }

    #[test]
    fn illegal_transitions_are_errors() {
        assert_eq!(
            Disconnected.apply(Start),
            Err(TransitionError {
                from: Disconnected,
                action: Start
            })
        );
        assert!(Reading.apply(Start).is_err());
        assert!(Connected.apply(Stop).is_err());
        assert!(Connecting.apply(Disconnect).is_err());
        assert!(Disconnected.apply(Disconnect).is_err());
        assert!(Connected.apply(Connect).is_err());
    }

    #[test]
    fn every_pair_is_handled() {
        let states = [Disconnected, Connecting, Connected, Reading, Stopped];
        let actions = [Connect, Established, Fail, Start, Stop, Disconnect];
        let legal = states
            .iter()
            .flat_map(|s| actions.iter().map(move |a| s.apply(*a)))
            .filter(Result::is_ok)
            .count();
        assert_eq!(legal, 9);
    }

    #[test]
    fn simulator_is_monotonic() {
        let mut sim = Simulator::default();
        let first = sim.next(Utc::now());
        let second = sim.next(Utc::now());
        assert_eq!(first.len(), 3);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.meter_id, b.meter_id);
            assert!(b.value > a.value);
        }
    }

    #[test]
    fn transition_error_message() {
        let err = Disconnected.apply(Stop).unwrap_err();
        assert_eq!(err.to_string(), "cannot Stop while disconnected");
    }
}
