//! `trace rm` -- delete curves.

use anyhow::{Result, bail};
use trace_core::CurveKey;
use trace_ui::styles::render_warn;

use crate::cli::RmArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `trace rm` command.
pub fn run(ctx: &RuntimeContext, args: &RmArgs) -> Result<()> {
    let mut session = ctx.open_session()?;

    let mut removed: Vec<CurveKey> = Vec::new();
    let mut dangling: Vec<CurveKey> = Vec::new();
    let mut failed = 0usize;

    for name in &args.keys {
        // An earlier cascade may already have taken this one.
        let key = match session.resolve(name) {
            Ok(key) if removed.contains(&key) => continue,
            Ok(key) => key,
            Err(e) => {
                eprintln!("{}", e);
                failed += 1;
                continue;
            }
        };
        match session.delete(key) {
            Ok(removal) => {
                if !ctx.json && !ctx.quiet {
                    for k in &removal.removed {
                        println!("Deleted {}", k);
                    }
                }
                removed.extend(removal.removed);
                dangling.extend(removal.dangling);
            }
            Err(e) => {
                eprintln!("{}: {}", key, e);
                failed += 1;
            }
        }
    }

    if !removed.is_empty() {
        ctx.save(&session)?;
    }
    dangling.retain(|k| !removed.contains(k));
    dangling.sort();
    dangling.dedup();

    if ctx.json {
        output_json(&serde_json::json!({
            "removed": removed,
            "dangling": dangling,
        }));
    } else {
        for k in &dangling {
            eprintln!(
                "{}",
                render_warn(&format!("{} references a deleted curve", k))
            );
        }
    }

    if failed > 0 && removed.is_empty() {
        bail!("no curves were deleted");
    }
    Ok(())
}
