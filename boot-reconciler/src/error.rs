use crate::bootstrap::Phase;

/// A fatal error that aborts the bootstrap pass.
///
/// Every variant keeps the collaborator's error as its source, so the original
/// cause is preserved verbatim in the error chain.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to check whether an os update is in progress")]
    OsUpdateQuery(#[source] eyre::Report),
    #[error("failed to check os reconciliation")]
    ReconciliationCheck(#[source] eyre::Report),
    #[error("failed to check whether the os update is rolling back")]
    RollbackQuery(#[source] eyre::Report),
    #[error("failed to commit rollback")]
    RollbackCommit(#[source] eyre::Report),
    #[error("failed to commit os update")]
    UpgradeCommit(#[source] eyre::Report),
    #[error("failed to read the device spec")]
    SpecRead(#[source] eyre::Report),
    #[error("failed to read the booted os status")]
    OsStatus(#[source] eyre::Report),
}

impl BootstrapError {
    /// `true` if one of the facts the state machine branches on could not be
    /// established.
    pub fn is_query_failure(&self) -> bool {
        matches!(
            self,
            Self::OsUpdateQuery(_) | Self::ReconciliationCheck(_) | Self::RollbackQuery(_)
        )
    }

    /// `true` if a terminal action was decided on but could not be committed.
    pub fn is_commit_failure(&self) -> bool {
        matches!(self, Self::RollbackCommit(_) | Self::UpgradeCommit(_))
    }

    /// The bootstrap phase the error originated from.
    pub fn phase(&self) -> Phase {
        match self {
            Self::SpecRead(_) | Self::OsStatus(_) => Phase::Init,
            Self::OsUpdateQuery(_) => Phase::UpdateCheck,
            Self::ReconciliationCheck(_) => Phase::ReconciliationCheck,
            Self::RollbackQuery(_) => Phase::RollbackCheck,
            Self::RollbackCommit(_) => Phase::RollingBack,
            Self::UpgradeCommit(_) => Phase::Upgrading,
        }
    }

    /// The collaborator error that caused this failure.
    pub fn report(&self) -> &eyre::Report {
        match self {
            Self::OsUpdateQuery(e)
            | Self::ReconciliationCheck(e)
            | Self::RollbackQuery(e)
            | Self::RollbackCommit(e)
            | Self::UpgradeCommit(e)
            | Self::SpecRead(e)
            | Self::OsStatus(e) => e,
        }
    }
}
