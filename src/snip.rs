//! The snip archive layout.
//!
//! ```text
//! <hostname>-<date>-<time>.snip/
//!   attributes.json
//!   manifest.json
//!   data/
//!     <the four raw files>
//!     metadata.msc.json
//! ```

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use crate::error::SnipError;
use crate::file_set::RawDataFileSet;
use crate::store::Store;

pub const SNIP_EXTENSION: &str = "snip";
pub const ATTRIBUTES_FILE_NAME: &str = "attributes.json";
pub const MANIFEST_FILE_NAME: &str = "manifest.json";
pub const DATA_DIR_NAME: &str = "data";
pub const METADATA_FILE_NAME: &str = "metadata.msc.json";

pub const ATTRIBUTES: &str = "{}";

pub const MANIFEST: &str = r#"
{
    "extensionToMediaType": {
        ".json": "application/vnd.sbt.measurement-report+json",
        ".msc.json": "application/vnd.sbt.misc+json"
    },
    "pathToMediaType": {
        "attributes.json": "application/vnd.sbt.snip.attributes+json"
    }
}
"#;

/// What to do when the snip directory already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplacePolicy {
    /// Fail with [`SnipError::DestinationNotEmpty`] if it has entries.
    #[default]
    Keep,
    /// Delete it and start over.
    Replace,
}

impl From<bool> for ReplacePolicy {
    fn from(replace_existing: bool) -> Self {
        if replace_existing {
            ReplacePolicy::Replace
        } else {
            ReplacePolicy::Keep
        }
    }
}

/// Packages one file set into `<destination_root>/<hostname>-<date>-<time>.snip`
/// and returns that path.
///
/// A failure after the directory is created leaves it partially populated.
pub fn package(
    file_set: &RawDataFileSet,
    destination_root: &Utf8Path,
    policy: ReplacePolicy,
) -> Result<Utf8PathBuf, SnipError> {
    let store = Store::new_with_root(destination_root.to_path_buf());
    let snip_dir = store.snip_dir(&file_set.snip_name());
    debug!(snip = %snip_dir, ?policy, "packaging");

    prepare_dir(&snip_dir, policy)?;

    Store::write_bytes_atomic(&snip_dir.join(ATTRIBUTES_FILE_NAME), ATTRIBUTES.as_bytes())?;
    Store::write_bytes_atomic(&snip_dir.join(MANIFEST_FILE_NAME), MANIFEST.as_bytes())?;

    let data_dir = snip_dir.join(DATA_DIR_NAME);
    fs::create_dir_all(data_dir.as_std_path())
        .map_err(|err| SnipError::Filesystem(format!("create {data_dir}: {err}")))?;

    for source in file_set.sources() {
        let name = source
            .file_name()
            .ok_or_else(|| SnipError::Filesystem(format!("no file name in {source}")))?;
        Store::copy_file_atomic(source, &data_dir.join(name))?;
    }

    let metadata = file_set.metadata().to_json()?;
    Store::write_bytes_atomic(&data_dir.join(METADATA_FILE_NAME), metadata.as_bytes())?;

    info!(snip = %snip_dir, "packaged");
    Ok(snip_dir)
}

fn prepare_dir(snip_dir: &Utf8Path, policy: ReplacePolicy) -> Result<(), SnipError> {
    match policy {
        ReplacePolicy::Replace => {
            match fs::remove_dir_all(snip_dir.as_std_path()) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(SnipError::Filesystem(format!("remove {snip_dir}: {err}")));
                }
            }
            fs::create_dir(snip_dir.as_std_path())
                .map_err(|err| SnipError::Filesystem(format!("create {snip_dir}: {err}")))
        }
        ReplacePolicy::Keep => {
            match fs::create_dir(snip_dir.as_std_path()) {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(err) => {
                    return Err(SnipError::Filesystem(format!("create {snip_dir}: {err}")));
                }
            }
            let mut entries = fs::read_dir(snip_dir.as_std_path())
                .map_err(|err| SnipError::Filesystem(format!("read {snip_dir}: {err}")))?;
            if entries.next().is_some() {
                return Err(SnipError::DestinationNotEmpty(snip_dir.to_path_buf()));
            }
            Ok(())
        }
    }
}
