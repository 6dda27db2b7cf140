//! `trace set` -- change a curve's active and data-source flags.

use anyhow::{Context, Result, bail};

use crate::cli::SetArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `trace set` command.
pub fn run(ctx: &RuntimeContext, args: &SetArgs) -> Result<()> {
    if args.active.is_none() && args.live.is_none() && args.archive.is_none() {
        bail!("nothing to set (use --active, --live or --archive)");
    }

    let mut session = ctx.open_session()?;
    let key = session.resolve(&args.key)?;
    if let Some(active) = args.active {
        session.set_active(key, active)?;
    }
    if let Some(live) = args.live {
        session.set_live_data(key, live)?;
    }
    if let Some(archive) = args.archive {
        session.set_archive_data(key, archive)?;
    }
    ctx.save(&session)?;

    let curve = session
        .curve(key)
        .with_context(|| format!("curve {} vanished", key))?;
    if ctx.json {
        output_json(&serde_json::json!({
            "key": key,
            "active": curve.active,
            "live": curve.use_live_data,
            "archive": curve.use_archive_data,
        }));
    } else if !ctx.quiet {
        println!(
            "{}: active={} live={} archive={}",
            key, curve.active, curve.use_live_data, curve.use_archive_data
        );
    }
    Ok(())
}
