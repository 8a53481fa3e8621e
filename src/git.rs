use std::path::PathBuf;
use std::process::{Command, Stdio};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::error::SnipError;

/// The handful of git and git-lfs operations the private-assets bootstrap needs.
pub trait GitClient: Send + Sync {
    fn clone_repo(&self, url: &str, directory: &Utf8Path) -> Result<(), SnipError>;
    /// Fails with [`SnipError::MissingTool`] when the `git lfs` extension is absent.
    fn ensure_lfs(&self, directory: &Utf8Path) -> Result<(), SnipError>;
    fn install_lfs(&self, directory: &Utf8Path) -> Result<(), SnipError>;
    fn fetch_lfs(&self, directory: &Utf8Path, include: &[String]) -> Result<(), SnipError>;
    fn checkout_lfs(&self, directory: &Utf8Path) -> Result<(), SnipError>;
    /// Top level of the work tree containing the current directory, if any.
    fn show_toplevel(&self) -> Option<Utf8PathBuf>;
}

/// Runs the `git` binary found on `PATH`.
#[derive(Debug, Clone)]
pub struct SystemGit {
    git: Option<PathBuf>,
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemGit {
    pub fn new() -> Self {
        Self {
            git: find_in_path("git"),
        }
    }

    fn require_git(&self) -> Result<&PathBuf, SnipError> {
        self.git
            .as_ref()
            .ok_or_else(|| SnipError::MissingTool("git".to_string()))
    }

    /// Runs `git [-C directory] args...` with output passed through, so clone
    /// and fetch progress stays visible.
    fn run(&self, directory: Option<&Utf8Path>, args: &[&str]) -> Result<(), SnipError> {
        let git = self.require_git()?;
        let mut cmd = Command::new(git);
        if let Some(dir) = directory {
            cmd.arg("-C").arg(dir.as_std_path());
        }
        cmd.args(args);
        debug!(?args, directory = ?directory.map(Utf8Path::as_str), "git run");
        let status = cmd
            .status()
            .map_err(|err| SnipError::Git(err.to_string()))?;
        if status.success() {
            return Ok(());
        }
        Err(SnipError::Git(format!("git {} exited with {status}", args.join(" "))))
    }
}

impl GitClient for SystemGit {
    fn clone_repo(&self, url: &str, directory: &Utf8Path) -> Result<(), SnipError> {
        debug!(directory = %directory, "git clone");
        self.run(None, &["clone", url, directory.as_str()])
    }

    fn ensure_lfs(&self, directory: &Utf8Path) -> Result<(), SnipError> {
        let git = self.require_git()?;
        let output = Command::new(git)
            .arg("-C")
            .arg(directory.as_std_path())
            .arg("lfs")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| SnipError::Git(err.to_string()))?;
        if output.status.success() {
            return Ok(());
        }
        Err(SnipError::MissingTool(
            "git-lfs (install it with 'sudo apt update && sudo apt install git-lfs')".to_string(),
        ))
    }

    fn install_lfs(&self, directory: &Utf8Path) -> Result<(), SnipError> {
        self.run(Some(directory), &["lfs", "install"])
    }

    fn fetch_lfs(&self, directory: &Utf8Path, include: &[String]) -> Result<(), SnipError> {
        let mut args = vec!["lfs", "fetch"];
        if !include.is_empty() {
            args.push("--include");
            args.extend(include.iter().map(String::as_str));
        }
        self.run(Some(directory), &args)
    }

    fn checkout_lfs(&self, directory: &Utf8Path) -> Result<(), SnipError> {
        self.run(Some(directory), &["lfs", "checkout"])
    }

    fn show_toplevel(&self) -> Option<Utf8PathBuf> {
        let git = self.git.as_ref()?;
        let output = Command::new(git)
            .args(["rev-parse", "--show-toplevel"])
            .stderr(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let stdout = String::from_utf8(output.stdout).ok()?;
        let trimmed = stdout.trim();
        (!trimmed.is_empty()).then(|| Utf8PathBuf::from(trimmed))
    }
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for path in std::env::split_paths(&path_var) {
        let exe = path.join(format!("{name}.exe"));
        if exe.exists() {
            return Some(exe);
        }
        let plain = path.join(name);
        if plain.exists() {
            return Some(plain);
        }
    }
    None
}
