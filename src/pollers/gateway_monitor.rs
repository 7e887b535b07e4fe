//! Background gateway status monitor
//!
//! Polls the gateway list on a fixed interval and publishes
//! `GatewayStatusChanged` when a known gateway goes online or offline. A
//! failed poll keeps the previous snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bus::{BusEvent, SharedBus};
use crate::model::Gateway;
use crate::upstream::{ApiClient, ApiError};

const GATEWAYS_PATH: &str = "/api/mbus/gateways";

#[derive(Debug, Default)]
struct MonitorState {
    running: bool,
    gateways: Vec<Gateway>,
    last_poll: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub running: bool,
    pub online: usize,
    pub total: usize,
    pub last_poll: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Clone)]
pub struct GatewayMonitor {
    api: ApiClient,
    bus: SharedBus,
    interval: Duration,
    state: Arc<RwLock<MonitorState>>,
    shutdown: Arc<RwLock<CancellationToken>>,
}

/// Online transitions between two polls; gateways seen for the first time
/// are not transitions
pub fn online_changes(previous: &[Gateway], current: &[Gateway]) -> Vec<(String, bool)> {
    current
        .iter()
        .filter_map(|gw| {
            let before = previous.iter().find(|p| p.id == gw.id)?;
            (before.is_online() != gw.is_online()).then(|| (gw.id.to_string(), gw.is_online()))
        })
        .collect()
}

impl GatewayMonitor {
    pub fn new(api: ApiClient, bus: SharedBus, interval: Duration) -> Self {
        Self {
            api,
            bus,
            interval,
            state: Arc::new(RwLock::new(MonitorState::default())),
            shutdown: Arc::new(RwLock::new(CancellationToken::new())),
        }
    }

    async fn start_internal(&self) -> anyhow::Result<()> {
        {
            let mut state = self.state.write().await;
            if state.running {
                return Ok(());
            }
            state.running = true;
        }

        // Fresh token per run; the previous one may be cancelled
        let shutdown = {
            let mut token = self.shutdown.write().await;
            *token = CancellationToken::new();
            token.clone()
        };

        let monitor = self.clone();
        tokio::spawn(async move {
            monitor.poll_loop(shutdown).await;
        });

        info!(interval = ?self.interval, "Gateway monitor started");
        Ok(())
    }

    async fn stop_internal(&self) {
        self.shutdown.read().await.cancel();
        self.state.write().await.running = false;
        info!("Gateway monitor stopped");
    }

    async fn poll_loop(&self, shutdown: CancellationToken) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Gateway monitor loop exiting");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        warn!(error = %e, "Gateway poll failed, keeping previous snapshot");
                    }
                }
            }
        }
    }

    /// One poll; returns the number of online transitions published
    pub async fn poll_once(&self) -> Result<usize, ApiError> {
        let fetched = self.api.get_list::<Gateway>(GATEWAYS_PATH).await;
        let mut state = self.state.write().await;
        state.last_poll = Some(Utc::now());

        let gateways = match fetched {
            Ok(gateways) => gateways,
            Err(e) => {
                state.last_error = Some(e.user_message());
                return Err(e);
            }
        };

        let changes = online_changes(&state.gateways, &gateways);
        for (gateway_id, online) in &changes {
            info!(gateway_id = %gateway_id, online = *online, "Gateway status changed");
            self.bus.publish(BusEvent::GatewayStatusChanged {
                gateway_id: gateway_id.clone(),
                online: *online,
            });
        }
        state.gateways = gateways;
        state.last_error = None;
        Ok(changes.len())
    }

    pub async fn gateways(&self) -> Vec<Gateway> {
        self.state.read().await.gateways.clone()
    }

    pub async fn snapshot(&self) -> MonitorSnapshot {
        let state = self.state.read().await;
        MonitorSnapshot {
            running: state.running,
            online: state.gateways.iter().filter(|g| g.is_online()).count(),
            total: state.gateways.len(),
            last_poll: state.last_poll,
            last_error: state.last_error.clone(),
        }
    }
}

crate::impl_startable!(GatewayMonitor, "gateway-monitor");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordId;

    fn gw(id: &str, online: bool) -> Gateway {
        Gateway {
            id: RecordId::from(id),
            online: Some(online),
            ..Default::default()
        }
    }

    #[test]
    fn only_known_gateways_produce_changes() {
        let previous = vec![gw("a", true), gw("b", false)];
        let current = vec![gw("a", false), gw("b", false), gw("c", true)];
        assert_eq!(online_changes(&previous, &current), vec![("a".to_string(), false)]);
        assert!(online_changes(&[], &current).is_empty());
    }

    #[tokio::test]
    async fn failed_poll_keeps_snapshot() {
        let api = ApiClient::new(&crate::config::ApiConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 1,
        })
        .unwrap();
        let monitor = GatewayMonitor::new(api, crate::bus::create_bus(), Duration::from_secs(60));
        monitor.state.write().await.gateways = vec![gw("a", true)];

        assert!(monitor.poll_once().await.is_err());
        let snapshot = monitor.snapshot().await;
        assert_eq!(snapshot.total, 1);
        assert_eq!(snapshot.online, 1);
        assert!(snapshot.last_error.is_some());
    }
}
