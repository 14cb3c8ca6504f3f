use std::sync::Arc;

use async_trait::async_trait;
use eyre::{Result, WrapErr as _};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::{RenderedDeviceSpec, SpecManager, SpecStore, SpecType};
use crate::os::OsClient;

/// [`SpecManager`] persisting specs in a [`SpecStore`] and asking an [`OsClient`]
/// which image is booted.
#[derive(Debug, Clone)]
pub struct FsSpecManager {
    store: SpecStore,
    os: Arc<dyn OsClient>,
}

impl FsSpecManager {
    pub fn new(store: SpecStore, os: Arc<dyn OsClient>) -> Self {
        Self { store, os }
    }

    async fn booted_image(&self, ctx: &CancellationToken) -> Result<String> {
        let status = self
            .os
            .status(ctx)
            .await
            .wrap_err("failed getting os status")?;
        Ok(status.booted_image)
    }
}

fn image(spec: &RenderedDeviceSpec) -> &str {
    spec.os_image().unwrap_or_default()
}

#[async_trait]
impl SpecManager for FsSpecManager {
    async fn ensure(&self) -> Result<()> {
        self.store.ensure().await
    }

    async fn read(&self, spec_type: SpecType) -> Result<RenderedDeviceSpec> {
        self.store.read(spec_type).await
    }

    async fn is_os_update(&self) -> Result<bool> {
        let current = self.store.read(SpecType::Current).await?;
        let desired = self.store.read(SpecType::Desired).await?;

        let Some(desired_image) = desired.os_image() else {
            return Ok(false);
        };
        Ok(desired_image != image(&current))
    }

    #[instrument(skip_all)]
    async fn check_os_reconciliation(&self, ctx: &CancellationToken) -> Result<(String, bool)> {
        let booted = self.booted_image(ctx).await?;
        let desired = self.store.read(SpecType::Desired).await?;

        let Some(desired_image) = desired.os_image() else {
            return Ok((booted, false));
        };
        let reconciled = booted == desired_image;
        debug!(%booted, desired = desired_image, reconciled);
        Ok((booted, reconciled))
    }

    #[instrument(skip_all)]
    async fn is_rolling_back(&self, ctx: &CancellationToken) -> Result<bool> {
        let rollback = self.store.read(SpecType::Rollback).await?;
        let Some(rollback_image) = rollback.os_image() else {
            return Ok(false);
        };

        let desired = self.store.read(SpecType::Desired).await?;
        if image(&desired) == rollback_image {
            return Ok(false);
        }

        let booted = self.booted_image(ctx).await?;
        Ok(booted == rollback_image)
    }

    async fn rollback(&self) -> Result<()> {
        info!("committing rollback spec as current and desired spec");
        self.store
            .copy(SpecType::Rollback, SpecType::Current)
            .await?;
        self.store
            .copy(SpecType::Rollback, SpecType::Desired)
            .await
    }

    async fn upgrade(&self) -> Result<()> {
        info!("committing desired spec as current and rollback spec");
        self.store
            .copy(SpecType::Desired, SpecType::Current)
            .await?;
        self.store
            .copy(SpecType::Desired, SpecType::Rollback)
            .await
    }
}
