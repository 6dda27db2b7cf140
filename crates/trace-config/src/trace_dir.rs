//! Discovery and management of the `.trace/` directory.
//!
//! The `.trace/` directory holds a project's `config.yaml` and saved
//! `layout.json`. This module finds it by walking up the directory tree and
//! creates it when initializing a new project.

use crate::config::ConfigError;
use std::path::{Path, PathBuf};

/// The name of the trace metadata directory.
pub const TRACE_DIR_NAME: &str = ".trace";

/// Environment variable that overrides directory discovery.
const TRACE_DIR_ENV: &str = "TRACE_DIR";

/// Walk up the directory tree from `start` looking for a `.trace/` directory.
///
/// The `TRACE_DIR` environment variable is checked first and wins if it names
/// an existing directory.
///
/// # Examples
///
/// ```no_run
/// use trace_config::trace_dir::find_trace_dir;
/// use std::path::Path;
///
/// if let Some(dir) = find_trace_dir(Path::new(".")) {
///     println!("Found trace dir at {}", dir.display());
/// }
/// ```
pub fn find_trace_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(TRACE_DIR_ENV) {
        let env_path = PathBuf::from(&env_dir);
        if env_path.is_dir() {
            return Some(env_path);
        }
    }

    let start = start.canonicalize().ok()?;
    start
        .ancestors()
        .map(|dir| dir.join(TRACE_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

/// Like [`find_trace_dir`], but a missing directory is an error.
///
/// # Errors
///
/// Returns [`ConfigError::TraceDirNotFound`] if no `.trace/` directory is
/// found.
pub fn find_trace_dir_or_error(start: &Path) -> Result<PathBuf, ConfigError> {
    find_trace_dir(start).ok_or(ConfigError::TraceDirNotFound)
}

/// Ensure a `.trace/` directory exists at `path` (or under it, if `path` is
/// not itself called `.trace`). Returns the directory.
pub fn ensure_trace_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let trace_dir = if path.ends_with(TRACE_DIR_NAME) {
        path.to_path_buf()
    } else {
        path.join(TRACE_DIR_NAME)
    };

    std::fs::create_dir_all(&trace_dir)?;
    Ok(trace_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_dir_from_child() {
        let dir = tempfile::tempdir().unwrap();
        let trace = dir.path().join(".trace");
        std::fs::create_dir(&trace).unwrap();

        let child = dir.path().join("plots").join("beamline");
        std::fs::create_dir_all(&child).unwrap();

        let found = find_trace_dir(&child).unwrap().canonicalize().unwrap();
        assert_eq!(found, trace.canonicalize().unwrap());
    }

    #[test]
    fn missing_start_is_none() {
        assert!(find_trace_dir(Path::new("/nonexistent/trace/start")).is_none());
    }

    #[test]
    fn ensure_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let first = ensure_trace_dir(dir.path()).unwrap();
        assert!(first.is_dir());
        assert!(first.ends_with(".trace"));
        assert_eq!(ensure_trace_dir(&first).unwrap(), first);
    }
}
