//! Reads the identity of the booted OS image from the host.

use std::{fmt, path::PathBuf, process::Stdio};

use async_trait::async_trait;
use eyre::{bail, Result, WrapErr as _};
use serde::Deserialize;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// What the host reports about its OS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsStatus {
    /// Identity of the running OS image. Empty if the host does not boot into a
    /// managed image.
    pub booted_image: String,
}

#[async_trait]
pub trait OsClient: Send + Sync + fmt::Debug {
    async fn status(&self, ctx: &CancellationToken) -> Result<OsStatus>;
}

/// Queries `bootc` for the booted image.
#[derive(Debug, Clone)]
pub struct BootcClient {
    bin: PathBuf,
}

impl BootcClient {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl OsClient for BootcClient {
    #[instrument(skip_all, fields(bin = %self.bin.display()))]
    async fn status(&self, ctx: &CancellationToken) -> Result<OsStatus> {
        let child = Command::new(&self.bin)
            .args(["status", "--json"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .wrap_err_with(|| format!("failed to spawn `{}`", self.bin.display()))?;

        let output = tokio::select! {
            output = child.wait_with_output() => {
                output.wrap_err("failed to wait for bootc")?
            }
            () = ctx.cancelled() => bail!("cancelled while waiting for bootc status"),
        };

        if !output.status.success() {
            bail!(
                "bootc status failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let status = parse_bootc_status(&output.stdout)?;
        debug!(booted_image = %status.booted_image, "read bootc status");
        Ok(status)
    }
}

/// For hosts which do not boot into a managed OS image.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyClient;

#[async_trait]
impl OsClient for DummyClient {
    async fn status(&self, _ctx: &CancellationToken) -> Result<OsStatus> {
        Ok(OsStatus::default())
    }
}

#[derive(Debug, Deserialize)]
struct BootcHost {
    status: Option<BootcHostStatus>,
}

#[derive(Debug, Deserialize)]
struct BootcHostStatus {
    booted: Option<BootcBootEntry>,
}

#[derive(Debug, Deserialize)]
struct BootcBootEntry {
    image: Option<BootcImageStatus>,
}

#[derive(Debug, Deserialize)]
struct BootcImageStatus {
    image: BootcImageReference,
}

#[derive(Debug, Deserialize)]
struct BootcImageReference {
    image: String,
}

/// Extracts `status.booted.image.image.image` from `bootc status --json`.
fn parse_bootc_status(stdout: &[u8]) -> Result<OsStatus> {
    let host: BootcHost = serde_json::from_slice(stdout)
        .wrap_err("failed parsing bootc status")?;

    let booted_image = host
        .status
        .and_then(|s| s.booted)
        .and_then(|b| b.image)
        .map(|i| i.image.image)
        .unwrap_or_default();

    Ok(OsStatus { booted_image })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_the_booted_image() {
        let stdout = br#"{
            "apiVersion": "org.containers.bootc/v1",
            "kind": "BootcHost",
            "spec": {"image": {"image": "quay.io/orb/os:v2", "transport": "registry"}},
            "status": {
                "staged": null,
                "booted": {
                    "image": {
                        "image": {"image": "quay.io/orb/os:v1", "transport": "registry"},
                        "imageDigest": "sha256:3b1f"
                    },
                    "pinned": false
                },
                "rollback": null
            }
        }"#;

        let status = parse_bootc_status(stdout).unwrap();
        assert_eq!(status.booted_image, "quay.io/orb/os:v1");
    }

    #[test]
    fn it_reports_an_empty_image_without_booted_entry() {
        let status = parse_bootc_status(br#"{"status": {"booted": null}}"#).unwrap();
        assert_eq!(status, OsStatus::default());

        let status = parse_bootc_status(b"{}").unwrap();
        assert_eq!(status, OsStatus::default());
    }

    #[test]
    fn it_fails_on_garbage_and_keeps_the_parse_error() {
        let err = parse_bootc_status(b"bootc: command not found").unwrap_err();
        assert_eq!(err.to_string(), "failed parsing bootc status");
        assert!(err.root_cause().is::<serde_json::Error>());
    }

    #[tokio::test]
    async fn it_fails_when_bootc_is_missing() {
        let client = BootcClient::new("/nonexistent/bootc");
        let err = client.status(&CancellationToken::new()).await.unwrap_err();
        assert!(format!("{err:?}").contains("failed to spawn"));
    }

    #[tokio::test]
    async fn dummy_client_reports_no_image() {
        let status = DummyClient.status(&CancellationToken::new()).await.unwrap();
        assert!(status.booted_image.is_empty());
    }
}
