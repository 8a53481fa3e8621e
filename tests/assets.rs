use std::fs;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use camino::{Utf8Path, Utf8PathBuf};

use snipify::assets::{AssetsBootstrap, AssetsCell, PRIVATE_ASSETS_LOCK_FILE_NAME};
use snipify::config::ResolvedConfig;
use snipify::error::SnipError;
use snipify::git::GitClient;

#[derive(Clone, Default)]
struct MockGit {
    calls: Arc<Mutex<Vec<String>>>,
    toplevel: Option<Utf8PathBuf>,
    without_lfs: bool,
}

impl MockGit {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl GitClient for MockGit {
    fn clone_repo(&self, url: &str, directory: &Utf8Path) -> Result<(), SnipError> {
        self.record(format!("clone {url}"));
        fs::create_dir_all(directory.join("executions")).unwrap();
        Ok(())
    }

    fn ensure_lfs(&self, _directory: &Utf8Path) -> Result<(), SnipError> {
        self.record("lfs".to_string());
        if self.without_lfs {
            return Err(SnipError::MissingTool("git-lfs".to_string()));
        }
        Ok(())
    }

    fn install_lfs(&self, _directory: &Utf8Path) -> Result<(), SnipError> {
        self.record("lfs install".to_string());
        Ok(())
    }

    fn fetch_lfs(&self, _directory: &Utf8Path, include: &[String]) -> Result<(), SnipError> {
        self.record(format!("lfs fetch {}", include.join(",")));
        Ok(())
    }

    fn checkout_lfs(&self, _directory: &Utf8Path) -> Result<(), SnipError> {
        self.record("lfs checkout".to_string());
        Ok(())
    }

    fn show_toplevel(&self) -> Option<Utf8PathBuf> {
        self.toplevel.clone()
    }
}

fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, root)
}

fn bootstrap(git: MockGit, cache_dir: Utf8PathBuf) -> AssetsBootstrap<MockGit> {
    AssetsBootstrap::with_cache_dir(
        git,
        cache_dir,
        Some("https://example.invalid/private-assets.git".to_string()),
        vec!["executions".to_string()],
    )
}

#[test]
fn empty_cache_runs_clone_and_lfs_in_order() {
    let (_temp, root) = temp_root();
    let git = MockGit::default();
    let cache = root.join("cache");

    let dir = bootstrap(git.clone(), cache.clone()).setup().unwrap();

    assert_eq!(dir, cache.join("private-assets"));
    assert!(cache.join(PRIVATE_ASSETS_LOCK_FILE_NAME).is_file());
    assert_eq!(
        git.calls(),
        vec![
            "clone https://example.invalid/private-assets.git",
            "lfs",
            "lfs install",
            "lfs fetch executions",
            "lfs checkout",
        ]
    );
}

#[test]
fn non_empty_checkout_stops_early() {
    let (_temp, root) = temp_root();
    let git = MockGit::default();
    let cache = root.join("cache");
    fs::create_dir_all(cache.join("private-assets/executions")).unwrap();

    let dir = bootstrap(git.clone(), cache.clone()).setup().unwrap();
    assert_eq!(dir, cache.join("private-assets"));
    assert!(git.calls().is_empty());

    bootstrap(git.clone(), cache).always_refresh().setup().unwrap();
    assert_eq!(git.calls().len(), 5);
}

#[test]
fn missing_lfs_aborts_before_fetch() {
    let (_temp, root) = temp_root();
    let git = MockGit {
        without_lfs: true,
        ..MockGit::default()
    };

    let result = bootstrap(git.clone(), root.join("cache")).setup();

    assert_matches!(result, Err(SnipError::MissingTool(tool)) if tool == "git-lfs");
    assert_eq!(
        git.calls(),
        vec!["clone https://example.invalid/private-assets.git", "lfs"]
    );
}

#[test]
fn missing_url_is_reported_when_clone_is_needed() {
    let (_temp, root) = temp_root();
    let bootstrap = AssetsBootstrap::with_cache_dir(
        MockGit::default(),
        root.join("cache"),
        None,
        Vec::new(),
    );
    assert_matches!(bootstrap.setup(), Err(SnipError::MissingAssetsUrl));
}

#[test]
fn cell_memoizes_first_success() {
    let (_temp, root) = temp_root();
    let git = MockGit::default();
    let cell = AssetsCell::new();
    assert!(cell.get().is_none());

    let first = cell
        .get_or_setup(&bootstrap(git.clone(), root.join("one")))
        .unwrap();
    let second = cell
        .get_or_setup(&bootstrap(git.clone(), root.join("two")))
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(cell.get(), Some(first));
    assert_eq!(git.calls().len(), 5);
    assert!(!root.join("two").exists());
}

#[test]
fn cell_does_not_memoize_failures() {
    let (_temp, root) = temp_root();
    let cell = AssetsCell::new();
    let failing =
        AssetsBootstrap::with_cache_dir(MockGit::default(), root.join("cache"), None, Vec::new());
    assert!(cell.get_or_setup(&failing).is_err());
    assert!(cell.get().is_none());

    let dir = cell
        .get_or_setup(&bootstrap(MockGit::default(), root.join("cache")))
        .unwrap();
    assert_eq!(dir, root.join("cache/private-assets"));
}

#[test]
fn cache_dir_defaults_to_project_toplevel() {
    let git = MockGit {
        toplevel: Some(Utf8PathBuf::from("/work/project")),
        ..MockGit::default()
    };
    let bootstrap = AssetsBootstrap::new(git, &ResolvedConfig::default()).unwrap();
    assert_eq!(bootstrap.cache_dir(), Utf8Path::new("/work/project/.snip_cache"));

    let config = ResolvedConfig {
        cache_dir: Some(Utf8PathBuf::from("/elsewhere")),
        ..ResolvedConfig::default()
    };
    let bootstrap = AssetsBootstrap::new(MockGit::default(), &config).unwrap();
    assert_eq!(
        bootstrap.private_assets_path(),
        Utf8Path::new("/elsewhere/private-assets")
    );
}
