//! `trace init` -- create a `.trace` directory in the current directory.

use std::env;

use anyhow::{Context, Result, bail};
use trace_config::config::CONFIG_FILE;
use trace_config::{TraceConfig, ensure_trace_dir, load_config, save_config};
use trace_core::PlotSession;

use crate::cli::InitArgs;
use crate::context::{LAYOUT_FILE, RuntimeContext};
use crate::output::output_json;

/// Execute the `trace init` command.
pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let cwd = env::current_dir().context("failed to get current directory")?;
    let trace_dir = ensure_trace_dir(&cwd)
        .with_context(|| format!("failed to create {}", cwd.join(".trace").display()))?;

    let layout_path = match &ctx.layout_path {
        Some(p) => p.clone(),
        None => trace_dir.join(LAYOUT_FILE),
    };

    if !args.force && layout_path.exists() {
        bail!(
            "Found existing layout at {}\n\n\
            This directory is already initialized.\n\
            Use --force to replace it with an empty layout.",
            layout_path.display()
        );
    }

    // Keep a hand-edited config; only write one when there is none.
    let config_path = trace_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        save_config(&trace_dir, &TraceConfig::default())
            .with_context(|| format!("failed to write {}", config_path.display()))?;
    }

    let options = load_config(&trace_dir)?.session_options()?;
    let session: PlotSession = PlotSession::new(options);
    session
        .to_layout()
        .save(&layout_path)
        .with_context(|| format!("failed to write {}", layout_path.display()))?;

    tracing::debug!(dir = %trace_dir.display(), "initialized trace directory");

    if ctx.json {
        output_json(&serde_json::json!({
            "trace_dir": trace_dir.display().to_string(),
            "layout": layout_path.display().to_string(),
            "config": config_path.display().to_string(),
        }));
    } else if !ctx.quiet {
        println!("Initialized empty layout in {}", trace_dir.display());
    }

    Ok(())
}
