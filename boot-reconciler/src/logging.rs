//! Logging for the boot reconciler: journald when running under systemd, stderr
//! otherwise.

use std::io::IsTerminal as _;

use eyre::WrapErr as _;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter,
};

pub const SYSLOG_IDENTIFIER: &str = "worldcoin-boot-reconciler";

/// Where log records are written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    Journald,
    Stderr,
}

impl Sink {
    /// A terminal on stderr means we are not running under systemd.
    pub fn detect(stderr_is_terminal: bool) -> Self {
        if stderr_is_terminal {
            Sink::Stderr
        } else {
            Sink::Journald
        }
    }
}

/// Installs the global subscriber and returns the sink in use.
///
/// The filter is taken from `RUST_LOG` and defaults to `info`. If journald is
/// requested but its socket is unavailable, logs go to stderr instead.
pub fn init() -> eyre::Result<Sink> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let journald_layer = match Sink::detect(std::io::stderr().is_terminal()) {
        Sink::Journald => tracing_journald::layer()
            .inspect_err(|err| {
                eprintln!("failed connecting to journald socket, using stderr: {err}");
            })
            .ok()
            .map(|layer| layer.with_syslog_identifier(SYSLOG_IDENTIFIER.to_owned())),
        Sink::Stderr => None,
    };
    let sink = if journald_layer.is_some() {
        Sink::Journald
    } else {
        Sink::Stderr
    };
    let stderr_layer = journald_layer.is_none().then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(journald_layer)
        .with(stderr_layer)
        .try_init()
        .wrap_err("failed to install tracing subscriber")?;

    Ok(sink)
}
