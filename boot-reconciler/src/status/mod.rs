//! Device status as reported by the boot reconciler, and the [`StatusManager`]
//! seam it is published through.

mod manager;

pub use manager::LocalStatusManager;

use async_trait::async_trait;
use derive_more::Display;
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum DeviceSummary {
    Online,
    Degraded,
    Error,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSummaryStatus {
    pub status: DeviceSummary,
    pub info: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOsStatus {
    pub image: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum DeviceUpdatedState {
    UpToDate,
    OutOfDate,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceUpdatedStatus {
    pub status: DeviceUpdatedState,
    pub info: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub summary: DeviceSummaryStatus,
    pub os: DeviceOsStatus,
    pub updated: DeviceUpdatedStatus,
}

/// A status mutation describing the outcome of a reconciliation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The booted image differs from the desired one.
    RollbackDetected { booted: String, desired: String },
    /// A rollback to the booted image was committed.
    RolledBack { booted: String, desired: String },
    /// The device booted into the desired image and the update was committed.
    UpdateFinalized { image: String },
}

impl StatusUpdate {
    pub fn apply(&self, status: &mut DeviceStatus) {
        match self {
            StatusUpdate::RollbackDetected { booted, desired } => {
                status.summary = DeviceSummaryStatus {
                    status: DeviceSummary::Degraded,
                    info: Some(format!(
                        "booted os image {booted} does not match desired os image {desired}"
                    )),
                };
                status.updated = DeviceUpdatedStatus {
                    status: DeviceUpdatedState::OutOfDate,
                    info: Some(format!("the device may be rolling back to {booted}")),
                };
            }
            StatusUpdate::RolledBack { booted, desired } => {
                status.summary = DeviceSummaryStatus {
                    status: DeviceSummary::Degraded,
                    info: Some(format!(
                        "os update to {desired} failed, rolled back to {booted}"
                    )),
                };
                status.os.image = booted.clone();
                status.updated = DeviceUpdatedStatus {
                    status: DeviceUpdatedState::OutOfDate,
                    info: Some(format!("rolled back from {desired}")),
                };
            }
            StatusUpdate::UpdateFinalized { image } => {
                status.summary = DeviceSummaryStatus {
                    status: DeviceSummary::Online,
                    info: None,
                };
                status.os.image = image.clone();
                status.updated = DeviceUpdatedStatus {
                    status: DeviceUpdatedState::UpToDate,
                    info: None,
                };
            }
        }
    }
}

/// Aggregates and publishes device status.
#[async_trait]
pub trait StatusManager: Send + Sync + fmt::Debug {
    /// Applies `update` to the device status and publishes the result.
    async fn update(&self, ctx: &CancellationToken, update: StatusUpdate) -> Result<DeviceStatus>;
}
