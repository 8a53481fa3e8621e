use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tempfile::Builder;

use crate::domain::RawIdentity;
use crate::error::SnipError;
use crate::snip::{METADATA_FILE_NAME, SNIP_EXTENSION};

/// Subdirectory of the private assets that holds packaged snips.
pub const EXECUTIONS_DIR_NAME: &str = "executions";

/// Layout of the packaging destination.
#[derive(Debug, Clone)]
pub struct Store {
    executions_root: Utf8PathBuf,
}

impl Store {
    /// Store rooted at `<private_assets>/executions`.
    pub fn in_private_assets(private_assets: &Utf8Path) -> Self {
        Self {
            executions_root: private_assets.join(EXECUTIONS_DIR_NAME),
        }
    }

    /// Store that packages straight into `root`.
    pub fn new_with_root(root: Utf8PathBuf) -> Self {
        Self {
            executions_root: root,
        }
    }

    pub fn executions_root(&self) -> &Utf8Path {
        &self.executions_root
    }

    pub fn snip_dir(&self, snip_name: &str) -> Utf8PathBuf {
        self.executions_root.join(format!("{snip_name}.{SNIP_EXTENSION}"))
    }

    pub fn ensure_executions_root(&self) -> Result<(), SnipError> {
        fs::create_dir_all(self.executions_root.as_std_path())
            .map_err(|err| SnipError::Filesystem(err.to_string()))
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), SnipError> {
        let parent = path
            .parent()
            .ok_or_else(|| SnipError::Filesystem(format!("invalid destination path {path}")))?;
        let temp = Builder::new()
            .prefix(".snipify-write")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| SnipError::Filesystem(err.to_string()))?;
        fs::write(temp.path(), content).map_err(|err| SnipError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| SnipError::Filesystem(err.to_string()))?;
        Ok(())
    }

    /// Copies into a temporary file next to `dest`, then moves it into place.
    pub fn copy_file_atomic(source: &Utf8Path, dest: &Utf8Path) -> Result<(), SnipError> {
        let parent = dest
            .parent()
            .ok_or_else(|| SnipError::Filesystem(format!("invalid destination path {dest}")))?;
        let temp = Builder::new()
            .prefix(".snipify-copy")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| SnipError::Filesystem(err.to_string()))?;
        fs::copy(source.as_std_path(), temp.path())
            .map_err(|err| SnipError::Filesystem(format!("copy {source}: {err}")))?;
        temp.persist(dest.as_std_path())
            .map_err(|err| SnipError::Filesystem(err.to_string()))?;
        Ok(())
    }

    /// Snip directories under the executions root, in directory order.
    pub fn list_snips(&self) -> Result<Vec<SnipEntry>, SnipError> {
        if !self.executions_root.as_std_path().exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(self.executions_root.as_std_path())
            .map_err(|err| SnipError::Filesystem(err.to_string()))?;

        let mut snips = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| SnipError::Filesystem(err.to_string()))?;
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
                continue;
            };
            if !path.as_std_path().is_dir() || path.extension() != Some(SNIP_EXTENSION) {
                continue;
            }
            snips.push(SnipEntry::from_dir(&path));
        }
        Ok(snips)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SnipEntry {
    pub name: String,
    pub path: String,
    pub hostname: Option<String>,
    pub recorded_at: Option<String>,
    pub has_metadata: bool,
}

impl SnipEntry {
    fn from_dir(path: &Utf8Path) -> Self {
        let name = path.file_stem().unwrap_or_default().to_string();
        // Snip names drop the prefix and mnemonic id, so pad them back for parsing.
        let identity = format!("-{name}-x").parse::<RawIdentity>().ok();
        Self {
            hostname: identity.as_ref().map(|id| id.hostname().to_string()),
            recorded_at: identity
                .as_ref()
                .and_then(RawIdentity::recorded_at)
                .map(|at| at.format("%Y-%m-%dT%H:%M:%S").to_string()),
            has_metadata: path
                .join("data")
                .join(METADATA_FILE_NAME)
                .as_std_path()
                .is_file(),
            path: path.to_string(),
            name,
        }
    }
}
