//! The device spec data model and the [`SpecManager`] seam.
//!
//! Three specs are tracked on disk, see [`SpecType`]. The controller only ever
//! talks to them through a [`SpecManager`].

mod manager;
mod store;

pub use manager::FsSpecManager;
pub use store::SpecStore;

use async_trait::async_trait;
use derive_more::Display;
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// The OS part of a rendered device spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOsSpec {
    pub image: String,
}

/// The desired configuration state of the device, as rendered by the control
/// plane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDeviceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<DeviceOsSpec>,
    #[serde(default)]
    pub rendered_version: String,
}

impl RenderedDeviceSpec {
    /// Builds a spec managing the given OS image.
    pub fn with_os_image(image: impl Into<String>, rendered_version: impl Into<String>) -> Self {
        Self {
            os: Some(DeviceOsSpec {
                image: image.into(),
            }),
            rendered_version: rendered_version.into(),
        }
    }

    /// The OS image this spec asks for.
    ///
    /// Returns `None` if the spec has no OS section or the image is empty, meaning
    /// the device OS is not managed through this spec.
    pub fn os_image(&self) -> Option<&str> {
        self.os
            .as_ref()
            .map(|os| os.image.as_str())
            .filter(|image| !image.is_empty())
    }
}

/// The specs persisted by the spec manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SpecType {
    /// The spec the device last successfully reconciled to.
    #[display("current")]
    Current,
    /// The spec the device is supposed to converge to.
    #[display("desired")]
    Desired,
    /// The known good spec to fall back to if an update fails.
    #[display("rollback")]
    Rollback,
}

impl SpecType {
    pub const ALL: [SpecType; 3] = [SpecType::Current, SpecType::Desired, SpecType::Rollback];

    pub fn file_name(self) -> &'static str {
        match self {
            SpecType::Current => "current.json",
            SpecType::Desired => "desired.json",
            SpecType::Rollback => "rollback.json",
        }
    }
}

/// Owns the desired and rendered specs together with the OS update bookkeeping.
///
/// Terminal actions ([`SpecManager::rollback`] and [`SpecManager::upgrade`])
/// commit the outcome of a reconciliation into persistent spec state.
#[async_trait]
pub trait SpecManager: Send + Sync + fmt::Debug {
    /// Creates any missing spec files.
    async fn ensure(&self) -> Result<()>;

    async fn read(&self, spec_type: SpecType) -> Result<RenderedDeviceSpec>;

    /// Is an OS update currently tracked as in progress.
    async fn is_os_update(&self) -> Result<bool>;

    /// Compares the booted image against the image the update targets.
    ///
    /// Returns the booted image and whether it matches.
    async fn check_os_reconciliation(&self, ctx: &CancellationToken) -> Result<(String, bool)>;

    /// Is the OS update mechanism currently unwinding an update.
    async fn is_rolling_back(&self, ctx: &CancellationToken) -> Result<bool>;

    /// Commits a rollback into persistent spec state.
    async fn rollback(&self) -> Result<()>;

    /// Commits a finished OS update into persistent spec state.
    async fn upgrade(&self) -> Result<()>;
}
