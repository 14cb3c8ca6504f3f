use std::process::{ExitCode, Termination};

use orb_boot_reconciler::{bootstrap::Phase, BootstrapError};

/// Exit codes returned by the boot reconciler. Custom exit codes are taken in
/// accordance with the Linux Standard Base Core Specification and are in the range
/// 150-199.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum BootReconcilerResult {
    Success = 0,
    Failure = 1,
    QueryFailed = 150,
    CommitFailed = 151,
    OsStatusFailed = 152,
}

impl Termination for BootReconcilerResult {
    fn report(self) -> ExitCode {
        ExitCode::from(self as u8)
    }
}

impl From<eyre::Report> for BootReconcilerResult {
    fn from(err: eyre::Report) -> Self {
        use BootReconcilerResult::{CommitFailed, Failure, OsStatusFailed, QueryFailed};
        match err.downcast_ref::<BootstrapError>() {
            Some(e) if e.is_query_failure() => QueryFailed,
            Some(e) if e.is_commit_failure() => CommitFailed,
            Some(BootstrapError::OsStatus(_)) => OsStatusFailed,
            _ => Failure,
        }
    }
}

/// The bootstrap phase `err` originated from, if it is a [`BootstrapError`].
pub(crate) fn failed_phase(err: &eyre::Report) -> Option<Phase> {
    err.downcast_ref::<BootstrapError>().map(BootstrapError::phase)
}
