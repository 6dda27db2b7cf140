//! `trace edit` -- change a curve's address or formula.

use std::time::Instant;

use anyhow::{Result, anyhow};
use trace_core::{EditOutcome, Replacement};
use trace_ui::styles::render_warn;

use crate::cli::EditArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `trace edit` command.
///
/// A formula edit is validated up front and committed after the configured
/// edit delay, which gives the curve a new key.
pub fn run(ctx: &RuntimeContext, args: &EditArgs) -> Result<()> {
    let mut session = ctx.open_session()?;
    let key = session.resolve(&args.key)?;
    let outcome = session.edit_curve(key, &args.text, Instant::now())?;

    let reports = ctx.commit(&mut session)?;
    let replacement = match reports.into_iter().find(|r| r.old_key == key) {
        Some(report) => Some(report.result.map_err(|e| anyhow!("replacing {}: {}", key, e))?),
        None => None,
    };

    if ctx.json {
        let value = match &replacement {
            Some(Replacement::Replaced { new_key, dangling }) => serde_json::json!({
                "key": key,
                "outcome": "replaced",
                "new_key": new_key,
                "dangling": dangling,
            }),
            _ => {
                let outcome = match outcome {
                    EditOutcome::AddressChanged => "address_changed",
                    _ => "unchanged",
                };
                serde_json::json!({ "key": key, "outcome": outcome })
            }
        };
        output_json(&value);
        return Ok(());
    }

    if ctx.quiet {
        return Ok(());
    }
    match (outcome, replacement) {
        (_, Some(Replacement::Replaced { new_key, dangling })) => {
            println!("Replaced {} with {}", key, new_key);
            for dependent in dangling {
                eprintln!(
                    "{}",
                    render_warn(&format!("{} still references {}", dependent, key))
                );
            }
        }
        (EditOutcome::AddressChanged, _) => println!("Updated {}", key),
        _ => println!("No change to {}", key),
    }
    Ok(())
}
