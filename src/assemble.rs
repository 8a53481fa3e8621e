use std::fmt;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{IQS_EXT, is_primary_artifact};
use crate::error::SnipError;
use crate::file_set::RawDataFileSet;
use crate::metadata::Miscellaneous;
use crate::template::QcTemplate;

/// Where the metadata of each file set comes from.
#[derive(Debug, Clone, Default)]
pub enum MetadataSource {
    #[default]
    None,
    Direct(Miscellaneous),
    Template(QcTemplate),
}

impl MetadataSource {
    pub fn from_parts(
        metadata: Option<Miscellaneous>,
        template: Option<QcTemplate>,
    ) -> Result<Self, SnipError> {
        match (metadata, template) {
            (Some(_), Some(_)) => Err(SnipError::ConflictingMetadataSource),
            (Some(metadata), None) => Ok(MetadataSource::Direct(metadata)),
            (None, Some(template)) => Ok(MetadataSource::Template(template)),
            (None, None) => Ok(MetadataSource::None),
        }
    }

    pub fn template(&self) -> Option<&QcTemplate> {
        match self {
            MetadataSource::Template(template) => Some(template),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AssembleOptions {
    pub skip_empty: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self { skip_empty: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Ready(RawDataFileSet),
    Skipped(Skip),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skip {
    pub file: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SkipReason {
    Invalid(String),
    Empty,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Invalid(message) => write!(f, "{message}"),
            SkipReason::Empty => write!(f, "it is empty"),
        }
    }
}

impl Candidate {
    pub fn ready(&self) -> Option<&RawDataFileSet> {
        match self {
            Candidate::Ready(set) => Some(set),
            Candidate::Skipped(_) => None,
        }
    }
}

/// Finds the runs in `raw_dir` and builds one file set per run.
///
/// Template validation is a whole-directory precondition: a missing template
/// member fails the call before any file set is built. Problems with a single
/// run become [`Candidate::Skipped`] instead.
pub fn assemble(
    raw_dir: &Utf8Path,
    source: &MetadataSource,
    options: AssembleOptions,
) -> Result<Vec<Candidate>, SnipError> {
    let mut entries = primary_files(raw_dir)?;
    debug!(count = entries.len(), dir = %raw_dir, "found primary files");

    if let Some(template) = source.template() {
        let files = entries
            .iter()
            .filter_map(|entry| entry.as_ref().ok().cloned())
            .collect::<Vec<_>>();
        template.validate_files(&files)?;
        entries.retain(|entry| match entry {
            Ok(file) => template.belongs_to(file),
            Err(_) => false,
        });
    }

    let mut candidates = Vec::with_capacity(entries.len());
    for entry in entries {
        let file = match entry {
            Ok(file) => file,
            Err(skip) => {
                warn!(file = %skip.file, reason = %skip.reason, "skipping raw file");
                candidates.push(Candidate::Skipped(skip));
                continue;
            }
        };
        candidates.push(build_candidate(&file, source, options)?);
    }
    Ok(candidates)
}

fn build_candidate(
    file: &Utf8Path,
    source: &MetadataSource,
    options: AssembleOptions,
) -> Result<Candidate, SnipError> {
    let metadata = match source {
        MetadataSource::None => None,
        MetadataSource::Direct(metadata) => Some(metadata.clone()),
        MetadataSource::Template(template) => Some(template.resolve_metadata(file)?),
    };

    let file_set = match RawDataFileSet::from_file(file, metadata) {
        Ok(file_set) => file_set,
        Err(err) => return Ok(skipped(file, SkipReason::Invalid(err.to_string()))),
    };

    if options.skip_empty {
        let len = fs::metadata(file.as_std_path())
            .map(|meta| meta.len())
            .map_err(|err| SnipError::Filesystem(format!("stat {file}: {err}")));
        match len {
            Ok(0) => return Ok(skipped(file, SkipReason::Empty)),
            Ok(_) => {}
            Err(err) => return Ok(skipped(file, SkipReason::Invalid(err.to_string()))),
        }
    }

    Ok(Candidate::Ready(file_set))
}

fn skipped(file: &Utf8Path, reason: SkipReason) -> Candidate {
    let name = file.file_name().unwrap_or(file.as_str()).to_string();
    warn!(file = %name, reason = %reason, "skipping raw file");
    Candidate::Skipped(Skip { file: name, reason })
}

/// Regular `*.iqs` files in directory order, fragments excluded. Names that
/// are not UTF-8 come back as skips.
fn primary_files(raw_dir: &Utf8Path) -> Result<Vec<Result<Utf8PathBuf, Skip>>, SnipError> {
    let entries = fs::read_dir(raw_dir.as_std_path())
        .map_err(|err| SnipError::Filesystem(format!("read {raw_dir}: {err}")))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| SnipError::Filesystem(err.to_string()))?;
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != IQS_EXT) {
            continue;
        }
        match Utf8PathBuf::from_path_buf(path) {
            Ok(path) => {
                if is_primary_artifact(&path) {
                    files.push(Ok(path));
                }
            }
            Err(path) => {
                let file = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_string_lossy().into_owned());
                let reason = SkipReason::Invalid(SnipError::NonUtf8Path(path).to_string());
                files.push(Err(Skip { file, reason }));
            }
        }
    }
    Ok(files)
}
