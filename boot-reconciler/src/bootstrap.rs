//! The boot reconciliation controller.
//!
//! Runs once per agent start, right after a reboot, and decides whether the
//! device booted into the OS image it was told to. Two checks run in order:
//!
//! 1. [`Bootstrap::check_rollback`] compares the booted against the desired image
//!    and commits a rollback if the OS update mechanism confirms it is unwinding
//!    an update;
//! 2. [`Bootstrap::ensure_booted_os`] finalizes (or unwinds) an OS update that is
//!    still tracked as in progress.
//!
//! A pass commits at most one terminal action. Status publication is best effort:
//! its failure is logged and never changes the outcome.

use std::sync::Arc;

use derive_more::Display;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::{
    error::BootstrapError,
    os::OsClient,
    spec::{RenderedDeviceSpec, SpecManager, SpecType},
    status::{StatusManager, StatusUpdate},
};

/// The outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Outcome {
    /// Nothing to reconcile.
    #[display("no action")]
    NoAction,
    /// A rollback was committed.
    #[display("rolled back")]
    RolledBack,
    /// An OS update was committed.
    #[display("upgraded")]
    Upgraded,
    /// The booted image does not match the desired one, but the update mechanism
    /// is not rolling back. No terminal action is taken; a later pass has to
    /// resolve this.
    #[display("pending (booted {booted}, desired {desired})")]
    Pending { booted: String, desired: String },
}

impl Outcome {
    /// `true` if a rollback or upgrade was committed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Outcome::RolledBack | Outcome::Upgraded)
    }
}

/// The phases of a bootstrap pass a fatal error can originate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    #[display("init")]
    Init,
    #[display("update check")]
    UpdateCheck,
    #[display("reconciliation check")]
    ReconciliationCheck,
    #[display("rollback check")]
    RollbackCheck,
    #[display("rolling back")]
    RollingBack,
    #[display("upgrading")]
    Upgrading,
}

/// Summary of a full bootstrap pass, see [`Bootstrap::initialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub booted_os: String,
    pub desired: RenderedDeviceSpec,
    pub rollback: Outcome,
    pub booted_os_check: Outcome,
}

/// The boot reconciliation controller.
#[derive(Debug, Clone, bon::Builder)]
pub struct Bootstrap {
    spec_manager: Arc<dyn SpecManager>,
    status_manager: Arc<dyn StatusManager>,
}

impl Bootstrap {
    /// Runs a full bootstrap pass: reads the booted image and the desired spec
    /// once, then runs [`Self::check_rollback`] followed by
    /// [`Self::ensure_booted_os`].
    #[instrument(skip_all)]
    pub async fn initialize(
        &self,
        ctx: &CancellationToken,
        os: &dyn OsClient,
    ) -> Result<BootstrapReport, BootstrapError> {
        self.spec_manager
            .ensure()
            .await
            .map_err(BootstrapError::SpecRead)?;

        let booted_os = os
            .status(ctx)
            .await
            .map_err(BootstrapError::OsStatus)?
            .booted_image;
        let desired = self
            .spec_manager
            .read(SpecType::Desired)
            .await
            .map_err(BootstrapError::SpecRead)?;
        info!(
            %booted_os,
            desired_os = desired.os_image().unwrap_or_default(),
            rendered_version = %desired.rendered_version,
            "starting boot reconciliation"
        );

        let rollback = match desired.os_image() {
            None => Outcome::NoAction,
            Some(_) if booted_os.is_empty() => {
                info!("host reports no booted os image, skipping rollback check");
                Outcome::NoAction
            }
            Some(desired_os) => self.check_rollback(ctx, &booted_os, desired_os).await?,
        };

        let booted_os_check = if rollback.is_terminal() {
            info!("rollback already committed, skipping booted os check");
            Outcome::NoAction
        } else {
            self.ensure_booted_os(ctx, &desired).await?
        };

        Ok(BootstrapReport {
            booted_os,
            desired,
            rollback,
            booted_os_check,
        })
    }

    /// Detects whether the device booted into an image other than the desired one,
    /// and commits the rollback if the update mechanism confirms it is rolling back.
    ///
    /// A divergence without a confirmed rollback is left to
    /// [`Self::ensure_booted_os`].
    #[instrument(skip(self, ctx))]
    pub async fn check_rollback(
        &self,
        ctx: &CancellationToken,
        booted_os: &str,
        desired_os: &str,
    ) -> Result<Outcome, BootstrapError> {
        if booted_os == desired_os {
            return Ok(Outcome::NoAction);
        }

        warn!("booted os image does not match desired os image");
        self.publish_status(
            ctx,
            StatusUpdate::RollbackDetected {
                booted: booted_os.to_owned(),
                desired: desired_os.to_owned(),
            },
        )
        .await;

        let rolling_back = self
            .spec_manager
            .is_rolling_back(ctx)
            .await
            .map_err(BootstrapError::RollbackQuery)?;
        if !rolling_back {
            info!("os update is not rolling back, deferring to booted os check");
            return Ok(Outcome::NoAction);
        }

        info!("os update is rolling back, committing rollback");
        self.spec_manager
            .rollback()
            .await
            .map_err(BootstrapError::RollbackCommit)?;

        Ok(Outcome::RolledBack)
    }

    /// Finalizes or unwinds an OS update that is in progress, depending on whether
    /// the device booted into the desired image.
    #[instrument(skip_all, fields(rendered_version = %desired.rendered_version))]
    pub async fn ensure_booted_os(
        &self,
        ctx: &CancellationToken,
        desired: &RenderedDeviceSpec,
    ) -> Result<Outcome, BootstrapError> {
        let Some(desired_os) = desired.os_image() else {
            return Ok(Outcome::NoAction);
        };

        let updating = self
            .spec_manager
            .is_os_update()
            .await
            .map_err(BootstrapError::OsUpdateQuery)?;
        if !updating {
            return Ok(Outcome::NoAction);
        }

        let (booted_os, reconciled) = self
            .spec_manager
            .check_os_reconciliation(ctx)
            .await
            .map_err(BootstrapError::ReconciliationCheck)?;

        if reconciled {
            info!(%booted_os, "booted into desired os image, committing os update");
            self.spec_manager
                .upgrade()
                .await
                .map_err(BootstrapError::UpgradeCommit)?;
            self.publish_status(
                ctx,
                StatusUpdate::UpdateFinalized {
                    image: desired_os.to_owned(),
                },
            )
            .await;
            return Ok(Outcome::Upgraded);
        }

        let rolling_back = self
            .spec_manager
            .is_rolling_back(ctx)
            .await
            .map_err(BootstrapError::RollbackQuery)?;
        if !rolling_back {
            warn!(
                %booted_os,
                desired_os,
                "booted os image does not match desired os image and the os update is \
                 not rolling back, leaving the update pending"
            );
            return Ok(Outcome::Pending {
                booted: booted_os,
                desired: desired_os.to_owned(),
            });
        }

        warn!(%booted_os, desired_os, "os update failed, committing rollback");
        self.spec_manager
            .rollback()
            .await
            .map_err(BootstrapError::RollbackCommit)?;
        self.publish_status(
            ctx,
            StatusUpdate::RolledBack {
                booted: booted_os,
                desired: desired_os.to_owned(),
            },
        )
        .await;

        Ok(Outcome::RolledBack)
    }

    /// Best effort: a failed status update is logged and otherwise ignored.
    async fn publish_status(&self, ctx: &CancellationToken, update: StatusUpdate) {
        if let Err(error) = self.status_manager.update(ctx, update).await {
            warn!(?error, "failed to update device status");
        }
    }
}
