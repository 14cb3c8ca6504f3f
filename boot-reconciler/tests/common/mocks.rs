use async_trait::async_trait;
use eyre::Result;
use mockall::mock;
use orb_boot_reconciler::{
    os::{self, OsStatus},
    spec::{self, RenderedDeviceSpec, SpecType},
    status::{self, DeviceStatus, StatusUpdate},
};
use tokio_util::sync::CancellationToken;

mock! {
    pub SpecManager {}

    #[async_trait]
    impl spec::SpecManager for SpecManager {
        async fn ensure(&self) -> Result<()>;
        async fn read(&self, spec_type: SpecType) -> Result<RenderedDeviceSpec>;
        async fn is_os_update(&self) -> Result<bool>;
        async fn check_os_reconciliation(&self, ctx: &CancellationToken) -> Result<(String, bool)>;
        async fn is_rolling_back(&self, ctx: &CancellationToken) -> Result<bool>;
        async fn rollback(&self) -> Result<()>;
        async fn upgrade(&self) -> Result<()>;
    }
}

mock! {
    pub StatusManager {}

    #[async_trait]
    impl status::StatusManager for StatusManager {
        async fn update(&self, ctx: &CancellationToken, update: StatusUpdate) -> Result<DeviceStatus>;
    }
}

mock! {
    pub OsClient {}

    #[async_trait]
    impl os::OsClient for OsClient {
        async fn status(&self, ctx: &CancellationToken) -> Result<OsStatus>;
    }
}

impl std::fmt::Debug for MockSpecManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSpecManager").finish()
    }
}

impl std::fmt::Debug for MockStatusManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStatusManager").finish()
    }
}

impl std::fmt::Debug for MockOsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockOsClient").finish()
    }
}
