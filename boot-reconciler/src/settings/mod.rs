use std::path::{Path, PathBuf};

use figment::providers::Format as _;
use serde::{Deserialize, Serialize};

mod args;
pub use args::Args;

#[cfg(test)]
mod tests;

pub const CFG_DEFAULT_PATH: &str = "/etc/orb_boot_reconciler.conf";
pub const ENV_VAR_PREFIX: &str = "ORB_BOOT_RECONCILER_";
pub const CFG_ENV_VAR: &str = const_format::concatcp!(ENV_VAR_PREFIX, "CONFIG");

/// Where the booted OS image is read from.
#[derive(
    Debug, Eq, PartialEq, Serialize, Deserialize, Copy, Clone, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OsClientKind {
    /// `bootc status`
    Bootc,
    /// The host does not boot into a managed OS image.
    Dummy,
}

/// `Settings` are the configurable options for running the boot reconciler.
///
/// The only entry point to construct `Settings` is `Settings::get`.
#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Directory holding the current, desired and rollback specs.
    pub data_dir: PathBuf,
    pub os_client: OsClientKind,
    /// Path to the `bootc` executable.
    pub bootc: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/usr/persistent/boot-reconciler"),
            os_client: OsClientKind::Bootc,
            bootc: PathBuf::from("/usr/bin/bootc"),
        }
    }
}

impl Settings {
    /// Constructs `Settings` from defaults, a config file, environment variables, and
    /// command line arguments. Command line arguments always take precedence over
    /// environment variables, which in turn take precedence over the config file.
    pub fn get<P: AsRef<Path>>(
        args: &Args,
        config: P,
        env_prefix: &str,
    ) -> figment::error::Result<Settings> {
        figment::Figment::new()
            .merge(figment::providers::Serialized::defaults(Settings::default()))
            .merge(figment::providers::Toml::file(config))
            .merge(figment::providers::Env::prefixed(env_prefix))
            .merge(figment::providers::Serialized::defaults(args))
            .extract()
    }
}
