//! `trace list` -- show axes and their curves.

use anyhow::Result;
use trace_ui::styles::render_warn_icon;

use crate::cli::ListArgs;
use crate::context::RuntimeContext;
use crate::output::{format_curve_row, format_tree, output_json, output_table};

/// Execute the `trace list` command.
pub fn run(ctx: &RuntimeContext, args: &ListArgs) -> Result<()> {
    let session = ctx.open_session()?;

    if ctx.json {
        output_json(&session.to_layout());
        return Ok(());
    }

    if session.axes().is_empty() {
        if !ctx.quiet {
            println!("No axes. Add a series with 'trace add <ADDRESS>'.");
        }
        return Ok(());
    }

    if args.flat {
        let mut rows = Vec::new();
        for axis in session.axes().iter() {
            for key in axis.curves() {
                if let Some(curve) = session.curve(*key) {
                    rows.push(format_curve_row(curve, axis.name()));
                }
            }
        }
        output_table(
            &["KEY", "AXIS", "COLOR", "ACTIVE", "LIVE", "ARCHIVE", "TEXT"],
            &rows,
        );
    } else {
        for line in format_tree(&session) {
            println!("{}", line);
        }
    }

    for (dependent, missing) in session.registry().dangling() {
        eprintln!(
            "{} {} references deleted curve {}",
            render_warn_icon(),
            dependent,
            missing
        );
    }
    Ok(())
}
