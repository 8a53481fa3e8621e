//! Setup of the private-assets checkout that snips are packaged into.
//!
//! The checkout lives in `<cache_dir>/private-assets`. A lock file next to it
//! keeps concurrent processes from cloning at the same time, and an
//! [`AssetsCell`] remembers the result for the rest of the process.

use std::fs::{self, File};
use std::sync::{Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use tracing::{debug, info};

use crate::config::ResolvedConfig;
use crate::error::SnipError;
use crate::git::GitClient;

pub const CACHE_DIR_NAME: &str = ".snip_cache";
pub const PRIVATE_ASSETS_DIR_NAME: &str = "private-assets";
pub const PRIVATE_ASSETS_LOCK_FILE_NAME: &str = "private-assets.lock";

pub struct AssetsBootstrap<G: GitClient> {
    git: G,
    cache_dir: Utf8PathBuf,
    url: Option<String>,
    include: Vec<String>,
    stop_if_not_empty: bool,
}

impl<G: GitClient> AssetsBootstrap<G> {
    /// Uses the configured cache dir, else `<git toplevel>/.snip_cache`, else
    /// the user cache dir.
    pub fn new(git: G, config: &ResolvedConfig) -> Result<Self, SnipError> {
        let cache_dir = match &config.cache_dir {
            Some(dir) => dir.clone(),
            None => default_cache_dir(&git)?,
        };
        Ok(Self::with_cache_dir(
            git,
            cache_dir,
            config.private_assets_url.clone(),
            config.lfs_include.clone(),
        ))
    }

    pub fn with_cache_dir(
        git: G,
        cache_dir: Utf8PathBuf,
        url: Option<String>,
        include: Vec<String>,
    ) -> Self {
        Self {
            git,
            cache_dir,
            url,
            include,
            stop_if_not_empty: true,
        }
    }

    /// Re-run the clone and lfs steps even when the checkout has content.
    pub fn always_refresh(mut self) -> Self {
        self.stop_if_not_empty = false;
        self
    }

    pub fn cache_dir(&self) -> &Utf8Path {
        &self.cache_dir
    }

    pub fn private_assets_path(&self) -> Utf8PathBuf {
        self.cache_dir.join(PRIVATE_ASSETS_DIR_NAME)
    }

    /// Clones and checks out the private assets unless they are already there.
    /// Holds an exclusive lock on the cache's lock file for the duration.
    pub fn setup(&self) -> Result<Utf8PathBuf, SnipError> {
        fs::create_dir_all(self.cache_dir.as_std_path())
            .map_err(|err| SnipError::Filesystem(format!("create {}: {err}", self.cache_dir)))?;

        let lock_path = self.cache_dir.join(PRIVATE_ASSETS_LOCK_FILE_NAME);
        let lock = File::options()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path.as_std_path())
            .map_err(|err| SnipError::Filesystem(format!("open {lock_path}: {err}")))?;
        debug!(lock = %lock_path, "waiting for private assets lock");
        lock.lock()
            .map_err(|err| SnipError::Filesystem(format!("lock {lock_path}: {err}")))?;

        let assets_dir = self.private_assets_path();
        if self.stop_if_not_empty && !is_dir_empty(&assets_dir)? {
            debug!(
                dir = %assets_dir,
                "private assets not empty; assuming they are current"
            );
            return Ok(assets_dir);
        }

        let url = self.url.as_deref().ok_or(SnipError::MissingAssetsUrl)?;
        info!(dir = %assets_dir, "setting up private assets");
        self.git.clone_repo(url, &assets_dir)?;
        self.git.ensure_lfs(&assets_dir)?;
        self.git.install_lfs(&assets_dir)?;
        self.git.fetch_lfs(&assets_dir, &self.include)?;
        self.git.checkout_lfs(&assets_dir)?;
        Ok(assets_dir)
    }
}

/// Process-wide memo of the private-assets directory. Only successes are
/// stored.
#[derive(Debug, Default)]
pub struct AssetsCell {
    value: Mutex<Option<Utf8PathBuf>>,
}

impl AssetsCell {
    pub const fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }

    pub fn get_or_setup<G: GitClient>(
        &self,
        bootstrap: &AssetsBootstrap<G>,
    ) -> Result<Utf8PathBuf, SnipError> {
        let mut guard = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dir) = guard.as_ref() {
            return Ok(dir.clone());
        }
        let dir = bootstrap.setup()?;
        *guard = Some(dir.clone());
        Ok(dir)
    }

    pub fn get(&self) -> Option<Utf8PathBuf> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

static PROCESS_ASSETS: AssetsCell = AssetsCell::new();

/// The private-assets directory for this process, set up on first use.
pub fn private_assets_dir<G: GitClient>(
    bootstrap: &AssetsBootstrap<G>,
) -> Result<Utf8PathBuf, SnipError> {
    PROCESS_ASSETS.get_or_setup(bootstrap)
}

fn default_cache_dir<G: GitClient>(git: &G) -> Result<Utf8PathBuf, SnipError> {
    if let Some(project_dir) = git.show_toplevel() {
        return Ok(project_dir.join(CACHE_DIR_NAME));
    }
    BaseDirs::new()
        .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.cache_dir().join("snipify")).ok())
        .ok_or_else(|| SnipError::Filesystem("unable to resolve cache directory".to_string()))
}

fn is_dir_empty(dir: &Utf8Path) -> Result<bool, SnipError> {
    if !dir.as_std_path().exists() {
        return Ok(true);
    }
    let mut entries = fs::read_dir(dir.as_std_path())
        .map_err(|err| SnipError::Filesystem(format!("read {dir}: {err}")))?;
    Ok(entries.next().is_none())
}
