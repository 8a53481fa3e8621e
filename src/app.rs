use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{error, info};

use crate::assemble::{AssembleOptions, Candidate, MetadataSource, Skip, assemble};
use crate::assets::{AssetsBootstrap, private_assets_dir};
use crate::config::ResolvedConfig;
use crate::error::SnipError;
use crate::file_set::RawDataFileSet;
use crate::git::GitClient;
use crate::snip::{ReplacePolicy, package};
use crate::store::{SnipEntry, Store};

/// Where snips go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// `<private assets>/executions`, setting the assets up if needed.
    PrivateAssets,
    /// A directory chosen by the caller; no bootstrap.
    Root(Utf8PathBuf),
}

#[derive(Debug, Clone)]
pub struct Discovery {
    pub ready: Vec<RawDataFileSet>,
    pub skipped: Vec<Skip>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackResult {
    pub destination: String,
    pub packaged: Vec<PackagedItem>,
    pub failed: Vec<FailedItem>,
    pub skipped: Vec<Skip>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackagedItem {
    pub source: String,
    pub snip_path: String,
    pub packaged_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedItem {
    pub source: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub destination: String,
    pub snips: Vec<SnipEntry>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<G: GitClient> {
    config: ResolvedConfig,
    git: G,
}

impl<G: GitClient + Clone> App<G> {
    pub fn new(config: ResolvedConfig, git: G) -> Self {
        Self { config, git }
    }

    /// Assembles the file sets of `raw_dir` and splits them into ready and
    /// skipped. Nothing is written.
    pub fn discover(
        &self,
        raw_dir: &Utf8Path,
        source: &MetadataSource,
        options: AssembleOptions,
        sink: &dyn ProgressSink,
    ) -> Result<Discovery, SnipError> {
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; scanning {raw_dir}"),
            elapsed: None,
        });

        let mut ready = Vec::new();
        let mut skipped = Vec::new();
        for candidate in assemble(raw_dir, source, options)? {
            match candidate {
                Candidate::Ready(file_set) => ready.push(file_set),
                Candidate::Skipped(skip) => {
                    sink.event(ProgressEvent {
                        message: format!("We skip '{}' due to: {}", skip.file, skip.reason),
                        elapsed: None,
                    });
                    skipped.push(skip);
                }
            }
        }

        info!(ready = ready.len(), skipped = skipped.len(), "discovered file sets");
        Ok(Discovery { ready, skipped })
    }

    /// Packages every ready file set. A failing set is recorded and the loop
    /// moves on to the next one.
    pub fn pack(
        &self,
        discovery: Discovery,
        destination: &Destination,
        policy: ReplacePolicy,
        sink: &dyn ProgressSink,
    ) -> Result<PackResult, SnipError> {
        let store = self.store(destination)?;
        store.ensure_executions_root()?;
        sink.event(ProgressEvent {
            message: format!("phase=Store; writing snips to {}", store.executions_root()),
            elapsed: None,
        });

        let mut packaged = Vec::new();
        let mut failed = Vec::new();
        for file_set in &discovery.ready {
            let start = Instant::now();
            match package(file_set, store.executions_root(), policy) {
                Ok(snip_path) => {
                    sink.event(ProgressEvent {
                        message: format!("packaged {}", snip_path),
                        elapsed: Some(start.elapsed()),
                    });
                    packaged.push(PackagedItem {
                        source: file_set.stem().to_string(),
                        snip_path: snip_path.to_string(),
                        packaged_at: iso_timestamp(),
                    });
                }
                Err(err) => {
                    error!(source = file_set.stem(), error = %err, "packaging failed");
                    sink.event(ProgressEvent {
                        message: format!("Error for {} due to: {err}", file_set.stem()),
                        elapsed: Some(start.elapsed()),
                    });
                    failed.push(FailedItem {
                        source: file_set.stem().to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok(PackResult {
            destination: store.executions_root().to_string(),
            packaged,
            failed,
            skipped: discovery.skipped,
        })
    }

    pub fn list(
        &self,
        destination: &Destination,
        sink: &dyn ProgressSink,
    ) -> Result<ListResult, SnipError> {
        let store = self.store(destination)?;
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; scanning {}", store.executions_root()),
            elapsed: None,
        });
        Ok(ListResult {
            destination: store.executions_root().to_string(),
            snips: store.list_snips()?,
        })
    }

    fn store(&self, destination: &Destination) -> Result<Store, SnipError> {
        match destination {
            Destination::Root(root) => Ok(Store::new_with_root(root.clone())),
            Destination::PrivateAssets => {
                let bootstrap = AssetsBootstrap::new(self.git.clone(), &self.config)?;
                let assets = private_assets_dir(&bootstrap)?;
                Ok(Store::in_private_assets(&assets))
            }
        }
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
