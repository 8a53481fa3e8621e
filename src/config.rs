use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::SnipError;

pub const DEFAULT_CONFIG_FILE: &str = "snipify.json";
pub const CACHE_DIR_ENV: &str = "SNIPIFY_CACHE_DIR";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub cache_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub private_assets_url: Option<String>,
    #[serde(default)]
    pub lfs_include: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    /// `None` means: derive it from the surrounding git project or the user cache.
    pub cache_dir: Option<Utf8PathBuf>,
    pub private_assets_url: Option<String>,
    pub lfs_include: Vec<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ConfigLoader::resolve_config(Config::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `snipify.json` in the current directory when no path
    /// is given. Only an explicit path has to exist.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, SnipError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| SnipError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content).map_err(|err| SnipError::ConfigParse(err.to_string()))?
        };
        check_schema_version(&config)?;

        let mut resolved = Self::resolve_config(config);
        if let Some(cache_dir) = std::env::var_os(CACHE_DIR_ENV) {
            let cache_dir = Utf8PathBuf::from_path_buf(PathBuf::from(cache_dir))
                .map_err(SnipError::NonUtf8Path)?;
            resolved.cache_dir = Some(cache_dir);
        }
        Ok(resolved)
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(SCHEMA_VERSION),
            cache_dir: config.cache_dir,
            private_assets_url: config.private_assets_url,
            lfs_include: config.lfs_include.unwrap_or_else(default_lfs_include),
        }
    }
}

fn check_schema_version(config: &Config) -> Result<(), SnipError> {
    match config.schema_version {
        None | Some(SCHEMA_VERSION) => Ok(()),
        Some(version) => Err(SnipError::ConfigParse(format!(
            "unsupported schema_version {version}, expected {SCHEMA_VERSION}"
        ))),
    }
}

pub fn default_lfs_include() -> Vec<String> {
    vec!["executions".to_string()]
}
