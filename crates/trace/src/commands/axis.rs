//! `trace axis` -- add, close, rename, range and show/hide axes.

use anyhow::{Result, bail};
use trace_ui::styles::render_warn;

use crate::cli::{AxisArgs, AxisCommands, RangeArgs};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute a `trace axis` subcommand.
pub fn run(ctx: &RuntimeContext, args: &AxisArgs) -> Result<()> {
    let mut session = ctx.open_session()?;

    let value = match &args.command {
        AxisCommands::Add { name } => {
            let id = session.add_axis(name.as_deref())?;
            let name = session
                .axes()
                .get(id)
                .map(|a| a.name().to_string())
                .unwrap_or_default();
            if !ctx.json && !ctx.quiet {
                println!("Added axis {}", name);
            }
            serde_json::json!({ "axis": name, "action": "added" })
        }
        AxisCommands::Rm { name } => {
            let removal = session.remove_axis(name)?;
            if !ctx.json {
                if !ctx.quiet {
                    println!("Closed axis {}", name);
                    for k in &removal.removed {
                        println!("Deleted {}", k);
                    }
                }
                for k in &removal.dangling {
                    eprintln!(
                        "{}",
                        render_warn(&format!("{} references a deleted curve", k))
                    );
                }
            }
            serde_json::json!({
                "axis": name,
                "action": "removed",
                "removed": removal.removed,
                "dangling": removal.dangling,
            })
        }
        AxisCommands::Rename { old, new } => {
            session.rename_axis(old, new)?;
            if !ctx.json && !ctx.quiet {
                println!("Renamed axis {} to {}", old, new.trim());
            }
            serde_json::json!({ "axis": new.trim(), "action": "renamed", "from": old })
        }
        AxisCommands::Range(range) => run_range(ctx, &mut session, range)?,
        AxisCommands::Show { name } => {
            session.set_axis_visible(name, true)?;
            if !ctx.json && !ctx.quiet {
                println!("Showing axis {}", name);
            }
            serde_json::json!({ "axis": name, "action": "shown" })
        }
        AxisCommands::Hide { name } => {
            session.set_axis_visible(name, false)?;
            if !ctx.json && !ctx.quiet {
                println!("Hiding axis {}", name);
            }
            serde_json::json!({ "axis": name, "action": "hidden" })
        }
    };

    ctx.save(&session)?;
    if ctx.json {
        output_json(&value);
    }
    Ok(())
}

fn run_range(
    ctx: &RuntimeContext,
    session: &mut trace_core::PlotSession,
    args: &RangeArgs,
) -> Result<serde_json::Value> {
    if args.auto {
        session.set_auto_range(&args.name, true)?;
        if !ctx.json && !ctx.quiet {
            println!("Axis {} uses auto-range", args.name);
        }
        return Ok(serde_json::json!({ "axis": args.name, "action": "range", "auto": true }));
    }
    let (Some(min), Some(max)) = (args.min, args.max) else {
        bail!("give --min and --max, or --auto");
    };
    session.set_range(&args.name, min, max)?;
    if !ctx.json && !ctx.quiet {
        println!("Axis {} range {} .. {}", args.name, min, max);
    }
    Ok(serde_json::json!({
        "axis": args.name,
        "action": "range",
        "auto": false,
        "min": min,
        "max": max,
    }))
}
