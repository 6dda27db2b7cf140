//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds the global flags and knows where the layout
//! and configuration live. Mutating commands go through
//! [`RuntimeContext::open_session`] and [`RuntimeContext::commit`].

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use trace_config::trace_dir::{find_trace_dir, find_trace_dir_or_error};
use trace_config::{TraceConfig, load_config};
use trace_core::{CommitReport, Layout, PlotSession};

use crate::cli::GlobalArgs;

/// File name of the saved layout inside `.trace/`.
pub const LAYOUT_FILE: &str = "layout.json";

/// Runtime context passed to every command handler.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Explicit `--layout` path, if given.
    pub layout_path: Option<PathBuf>,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        Self {
            layout_path: global.layout.clone(),
            json: global.json,
            verbose: global.verbose,
            quiet: global.quiet,
        }
    }

    /// The `.trace` directory above the current directory, if any.
    pub fn trace_dir(&self) -> Option<PathBuf> {
        let cwd = env::current_dir().ok()?;
        find_trace_dir(&cwd)
    }

    /// The layout file to read and write.
    pub fn resolve_layout_path(&self) -> Result<PathBuf> {
        if let Some(ref p) = self.layout_path {
            return Ok(p.clone());
        }
        let cwd = env::current_dir().context("failed to get current directory")?;
        Ok(find_trace_dir_or_error(&cwd)?.join(LAYOUT_FILE))
    }

    /// Configuration from the discovered `.trace` directory, or defaults
    /// (with environment overrides) when there is none.
    pub fn config(&self) -> Result<TraceConfig> {
        let dir = self.trace_dir().unwrap_or_else(|| PathBuf::from(".trace"));
        load_config(&dir).context("failed to load configuration")
    }

    /// Load the layout into a session. A missing layout file opens an empty
    /// session.
    pub fn open_session(&self) -> Result<PlotSession> {
        let options = self.config()?.session_options()?;
        let path = self.resolve_layout_path()?;
        if !path.exists() {
            if self.layout_path.is_none() {
                bail!(
                    "no layout found at {}\nHint: run 'trace init' to create one",
                    path.display()
                );
            }
            tracing::debug!(path = %path.display(), "starting a new layout");
            return Ok(PlotSession::new(options));
        }
        let layout = Layout::load(&path)?;
        let session = PlotSession::from_layout(&layout, options)
            .with_context(|| format!("failed to restore layout from {}", path.display()))?;
        Ok(session)
    }

    /// Run every queued formula replacement and save the layout.
    ///
    /// Returns the commit reports so callers can surface failed replacements.
    pub fn commit(&self, session: &mut PlotSession) -> Result<Vec<CommitReport>> {
        let reports = session.settle();
        self.save(session)?;
        Ok(reports)
    }

    pub fn save(&self, session: &PlotSession) -> Result<()> {
        let path = self.resolve_layout_path()?;
        session
            .to_layout()
            .save(&path)
            .with_context(|| format!("failed to save layout to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_layout_path_wins() {
        let ctx = RuntimeContext {
            layout_path: Some(PathBuf::from("/tmp/plot.json")),
            json: false,
            verbose: false,
            quiet: false,
        };
        assert_eq!(ctx.resolve_layout_path().unwrap(), PathBuf::from("/tmp/plot.json"));
    }

    #[test]
    fn explicit_missing_layout_opens_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RuntimeContext {
            layout_path: Some(dir.path().join("new.json")),
            json: false,
            verbose: false,
            quiet: false,
        };
        let session = ctx.open_session().unwrap();
        assert!(session.axes().is_empty());
    }
}
