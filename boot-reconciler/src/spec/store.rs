use std::path::PathBuf;

use eyre::{Result, WrapErr as _};
use tokio::{fs, io::AsyncWriteExt as _};
use tracing::{debug, info};

use super::{RenderedDeviceSpec, SpecType};

/// File backed persistence of the current, desired and rollback specs.
#[derive(Debug, Clone)]
pub struct SpecStore {
    dir: PathBuf,
}

impl SpecStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, spec_type: SpecType) -> PathBuf {
        self.dir.join(spec_type.file_name())
    }

    /// Creates the spec directory and writes an empty spec for every spec file that
    /// does not exist yet. Existing files are left untouched.
    pub async fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .wrap_err_with(|| format!("failed creating spec dir `{}`", self.dir.display()))?;

        for spec_type in SpecType::ALL {
            let path = self.path(spec_type);
            let exists = fs::try_exists(&path)
                .await
                .wrap_err_with(|| format!("failed checking for `{}`", path.display()))?;
            if !exists {
                info!("initializing empty {spec_type} spec at `{}`", path.display());
                self.write(spec_type, &RenderedDeviceSpec::default()).await?;
            }
        }
        Ok(())
    }

    pub async fn read(&self, spec_type: SpecType) -> Result<RenderedDeviceSpec> {
        let path = self.path(spec_type);
        let contents = fs::read(&path)
            .await
            .wrap_err_with(|| format!("failed reading {spec_type} spec `{}`", path.display()))?;
        serde_json::from_slice(&contents)
            .wrap_err_with(|| format!("failed parsing {spec_type} spec `{}`", path.display()))
    }

    /// Writes the spec next to its destination, syncs it and renames it into place,
    /// so a crash or power loss never leaves a partially written spec behind.
    pub async fn write(&self, spec_type: SpecType, spec: &RenderedDeviceSpec) -> Result<()> {
        let path = self.path(spec_type);
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_vec_pretty(spec)
            .wrap_err_with(|| format!("failed serializing {spec_type} spec"))?;

        let mut tmp_file = fs::File::create(&tmp)
            .await
            .wrap_err_with(|| format!("failed creating `{}`", tmp.display()))?;
        tmp_file
            .write_all(&contents)
            .await
            .wrap_err_with(|| format!("failed writing `{}`", tmp.display()))?;
        tmp_file
            .sync_all()
            .await
            .wrap_err_with(|| format!("failed syncing `{}`", tmp.display()))?;
        drop(tmp_file);

        fs::rename(&tmp, &path).await.wrap_err_with(|| {
            format!("failed moving `{}` to `{}`", tmp.display(), path.display())
        })?;
        self.sync_dir().await?;

        debug!(version = %spec.rendered_version, "wrote {spec_type} spec");
        Ok(())
    }

    /// Persists the directory entry of a rename.
    async fn sync_dir(&self) -> Result<()> {
        fs::File::open(&self.dir)
            .await
            .wrap_err_with(|| format!("failed opening spec dir `{}`", self.dir.display()))?
            .sync_all()
            .await
            .wrap_err_with(|| format!("failed syncing spec dir `{}`", self.dir.display()))
    }

    /// Overwrites the `to` spec with the contents of the `from` spec.
    pub async fn copy(&self, from: SpecType, to: SpecType) -> Result<()> {
        let spec = self.read(from).await?;
        self.write(to, &spec)
            .await
            .wrap_err_with(|| format!("failed copying {from} spec to {to} spec"))
    }
}
