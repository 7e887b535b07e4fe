//! Uniform lifecycle for background pollers

use anyhow::Result;
use async_trait::async_trait;

/// A background poller that can be started and stopped uniformly.
///
/// `main` starts every poller through this trait and stops them all on
/// shutdown through the same codepath.
#[async_trait]
pub trait Startable: Send + Sync {
    /// Short name for logs (e.g. "gateway-monitor")
    fn name(&self) -> &'static str;

    /// Start polling. No-op if already running.
    async fn start(&self) -> Result<()>;

    /// Stop polling; no further updates are committed once this returns.
    async fn stop(&self);

    /// Whether the poller has what it needs to run
    async fn can_start(&self) -> bool {
        true
    }
}

/// Implement [`Startable`] by delegating to `start_internal` / `stop_internal`.
///
/// ```ignore
/// impl_startable!(GatewayMonitor, "gateway-monitor");
/// ```
#[macro_export]
macro_rules! impl_startable {
    ($poller:ty, $name:literal) => {
        #[async_trait::async_trait]
        impl $crate::pollers::Startable for $poller {
            fn name(&self) -> &'static str {
                $name
            }

            async fn start(&self) -> anyhow::Result<()> {
                self.start_internal().await
            }

            async fn stop(&self) {
                self.stop_internal().await
            }
        }
    };
}
