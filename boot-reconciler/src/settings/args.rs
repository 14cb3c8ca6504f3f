use clap::Parser;
use serde::Serialize;

use super::OsClientKind;

/// Reconciles the booted OS image with the desired device spec after a reboot.
///
/// Commits the automatic rollback of a failed OS update, or finalizes an OS update
/// the device successfully booted into.
#[derive(Debug, Parser, Serialize)]
#[command(author, version)]
pub struct Args {
    /// The path to the config file.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    /// The directory holding the current, desired and rollback specs.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Where to read the booted OS image from.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_client: Option<OsClientKind>,
    /// The path to the `bootc` executable.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootc: Option<String>,
}
