//! `trace add` -- add direct series and formulas.

use std::fs;

use anyhow::{Context, Result, bail};
use trace_ui::styles::{render_fail_icon, render_pass_icon};

use crate::cli::AddArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `trace add` command.
///
/// Each series is added on its own; a rejected one is reported and the rest
/// are still added. The command fails only if nothing was added.
pub fn run(ctx: &RuntimeContext, args: &AddArgs) -> Result<()> {
    let mut items = args.series.clone();
    if let Some(path) = &args.from_file {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        items.extend(parse_series_file(&contents));
    }
    if items.is_empty() {
        bail!("no series to add");
    }

    let mut session = ctx.open_session()?;
    let next_before = session.registry().next_key();
    let results = session.add_many(args.axis.as_deref(), &items);
    let added = results.iter().filter(|(_, r)| r.is_ok()).count();
    // A rejected formula still consumes its key, so the counter may have
    // moved even when nothing was added.
    if session.registry().next_key() != next_before {
        ctx.save(&session)?;
    }

    if ctx.json {
        let rows: Vec<serde_json::Value> = results
            .iter()
            .map(|(text, result)| match result {
                Ok(key) => serde_json::json!({ "text": text, "key": key }),
                Err(e) => serde_json::json!({ "text": text, "error": e.to_string() }),
            })
            .collect();
        output_json(&rows);
    } else {
        for (text, result) in &results {
            match result {
                Ok(key) => {
                    if !ctx.quiet {
                        println!("{} Added {} {}", render_pass_icon(), key, text);
                    }
                }
                Err(e) => eprintln!("{} {}: {}", render_fail_icon(), text, e),
            }
        }
    }

    if added == 0 {
        bail!("no series were added");
    }
    Ok(())
}

/// Series listed in a file: one per line, blank lines and `#` comments
/// skipped.
fn parse_series_file(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
