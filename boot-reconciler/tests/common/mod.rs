#![allow(dead_code)]
pub mod mocks;

use mocks::{MockSpecManager, MockStatusManager};
use orb_boot_reconciler::Bootstrap;
use std::sync::Arc;

pub fn bootstrap(spec: MockSpecManager, status: MockStatusManager) -> Bootstrap {
    Bootstrap::builder()
        .spec_manager(Arc::new(spec))
        .status_manager(Arc::new(status))
        .build()
}
