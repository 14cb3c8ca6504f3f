//! `orb-boot-reconciler` runs once after every reboot, before the update agent, and
//! makes the persisted device spec agree with the OS image the device actually
//! booted into.

use std::{borrow::Cow, path::Path, sync::Arc};

use clap::Parser as _;
use eyre::WrapErr as _;
use orb_boot_reconciler::{
    logging,
    os::{BootcClient, DummyClient, OsClient},
    settings::{OsClientKind, CFG_DEFAULT_PATH, CFG_ENV_VAR, ENV_VAR_PREFIX},
    spec::{FsSpecManager, SpecStore},
    status::LocalStatusManager,
    Args, Bootstrap, Settings,
};
use tokio::signal::unix::{self, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

mod boot_reconciler_result;
use boot_reconciler_result::{failed_phase, BootReconcilerResult};

#[tokio::main]
async fn main() -> BootReconcilerResult {
    if let Err(err) = color_eyre::install() {
        eprintln!("failed to install color_eyre: {err:?}");
    }
    match logging::init() {
        Ok(sink) => debug!(?sink, "logging initialized"),
        Err(err) => eprintln!("failed to initialize logging: {err:?}"),
    }

    let args = Args::parse();

    match run(&args).await {
        Ok(()) => BootReconcilerResult::Success,
        Err(err) => {
            match failed_phase(&err) {
                Some(phase) => error!(%phase, "{err:?}"),
                None => error!("{err:?}"),
            }
            err.into()
        }
    }
}

fn get_config_source(args: &Args) -> Cow<'_, Path> {
    if let Some(config) = &args.config {
        info!("using config provided by command line argument: `{config}`");
        Cow::Borrowed(config.as_ref())
    } else if let Some(config) = figment::providers::Env::var(CFG_ENV_VAR) {
        info!("using config set in environment variable `{CFG_ENV_VAR}={config}`");
        Cow::Owned(std::path::PathBuf::from(config))
    } else {
        info!("using default config at `{CFG_DEFAULT_PATH}`");
        Cow::Borrowed(CFG_DEFAULT_PATH.as_ref())
    }
}

async fn run(args: &Args) -> eyre::Result<()> {
    let config = get_config_source(args);
    let settings = Settings::get(args, config, ENV_VAR_PREFIX)
        .wrap_err("failed reading settings")?;
    info!("running boot reconciler: {settings:?}");

    let os: Arc<dyn OsClient> = match settings.os_client {
        OsClientKind::Bootc => Arc::new(BootcClient::new(&settings.bootc)),
        OsClientKind::Dummy => Arc::new(DummyClient),
    };
    let spec_manager = FsSpecManager::new(SpecStore::new(&settings.data_dir), Arc::clone(&os));

    let bootstrap = Bootstrap::builder()
        .spec_manager(Arc::new(spec_manager))
        .status_manager(Arc::new(LocalStatusManager::default()))
        .build();

    let shutdown_token = CancellationToken::new();
    spawn_signal_handler(shutdown_token.clone())?;

    let report = bootstrap
        .initialize(&shutdown_token, os.as_ref())
        .await
        .wrap_err("boot reconciliation failed")?;

    info!(
        booted_os = %report.booted_os,
        rollback = %report.rollback,
        booted_os_check = %report.booted_os_check,
        "boot reconciliation finished"
    );
    Ok(())
}

/// Cancels `shutdown_token` on SIGINT or SIGTERM.
fn spawn_signal_handler(shutdown_token: CancellationToken) -> eyre::Result<()> {
    let mut sigint = unix::signal(SignalKind::interrupt())
        .wrap_err("failed to install SIGINT handler")?;
    let mut sigterm = unix::signal(SignalKind::terminate())
        .wrap_err("failed to install SIGTERM handler")?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => warn!("received SIGINT, cancelling boot reconciliation"),
            _ = sigterm.recv() => warn!("received SIGTERM, cancelling boot reconciliation"),
            () = shutdown_token.cancelled() => return,
        }
        shutdown_token.cancel();
    });

    Ok(())
}
