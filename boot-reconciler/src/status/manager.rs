use async_trait::async_trait;
use eyre::{bail, Result};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{DeviceStatus, StatusManager, StatusUpdate};

/// Keeps the latest [`DeviceStatus`] in memory and publishes every change to
/// its subscribers.
#[derive(Debug)]
pub struct LocalStatusManager {
    tx: watch::Sender<DeviceStatus>,
    require_subscriber: bool,
}

impl LocalStatusManager {
    pub fn new(initial: DeviceStatus) -> Self {
        let (tx, _) = watch::channel(initial);
        Self {
            tx,
            require_subscriber: false,
        }
    }

    /// Fail updates if nobody is listening for them.
    #[must_use]
    pub fn require_subscriber(self, require_subscriber: bool) -> Self {
        Self {
            require_subscriber,
            ..self
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DeviceStatus> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> DeviceStatus {
        self.tx.borrow().clone()
    }
}

impl Default for LocalStatusManager {
    fn default() -> Self {
        Self::new(DeviceStatus::default())
    }
}

#[async_trait]
impl StatusManager for LocalStatusManager {
    async fn update(&self, ctx: &CancellationToken, update: StatusUpdate) -> Result<DeviceStatus> {
        if ctx.is_cancelled() {
            bail!("status update cancelled");
        }
        if self.require_subscriber && self.tx.receiver_count() == 0 {
            bail!("no status subscribers to publish to");
        }

        self.tx.send_modify(|status| update.apply(status));
        let status = self.current();
        debug!(summary = %status.summary.status, updated = %status.updated.status, "published device status");
        Ok(status)
    }
}
