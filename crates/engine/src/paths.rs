use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Overrides project-root discovery when set.
pub const ROOT_ENV_VAR: &str = "SKYHOP_ROOT";

/// Directories the runtime reads content from, all derived from the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub levels_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let assets_dir = root.join("assets");
        let levels_dir = assets_dir.join("levels");
        Self {
            root,
            assets_dir,
            levels_dir,
        }
    }

    pub fn level_file(&self, file_name: &str) -> PathBuf {
        self.levels_dir.join(file_name)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{var} is not valid unicode")]
    EnvNotUnicode { var: &'static str },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("{var} points at {path}, which has no Cargo.toml next to crates/ or assets/")]
    InvalidEnvRoot { var: &'static str, path: PathBuf },
    #[error("no project root above {start_dir}; set {var} to the directory holding Cargo.toml and assets/")]
    RootNotFound { start_dir: PathBuf, var: &'static str },
}

/// Resolves the project root from [`ROOT_ENV_VAR`], falling back to a walk up from the executable.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
    resolve_root(env::var_os(ROOT_ENV_VAR), &exe).map(AppPaths::from_root)
}

fn resolve_root(override_value: Option<OsString>, exe: &Path) -> Result<PathBuf, StartupError> {
    if let Some(value) = override_value {
        let value = value.into_string().map_err(|_| StartupError::EnvNotUnicode {
            var: ROOT_ENV_VAR,
        })?;
        let root = canonical(Path::new(&value));
        if !is_project_root(&root) {
            return Err(StartupError::InvalidEnvRoot {
                var: ROOT_ENV_VAR,
                path: root,
            });
        }
        debug!(root = %root.display(), "project_root_from_env");
        return Ok(root);
    }

    let start_dir = exe.parent().unwrap_or(exe);
    let root = find_project_root(start_dir).ok_or_else(|| StartupError::RootNotFound {
        start_dir: canonical(start_dir),
        var: ROOT_ENV_VAR,
    })?;
    debug!(root = %root.display(), "project_root_discovered");
    Ok(root)
}

/// Nearest ancestor of `start` (inclusive) that looks like the project root.
fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_project_root(candidate))
        .map(canonical)
}

fn is_project_root(path: &Path) -> bool {
    path.join("Cargo.toml").is_file()
        && (path.join("crates").is_dir() || path.join("assets").is_dir())
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
