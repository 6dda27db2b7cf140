//! `trace mv` -- move a curve to another axis or position.

use anyhow::Result;

use crate::cli::MvArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `trace mv` command.
pub fn run(ctx: &RuntimeContext, args: &MvArgs) -> Result<()> {
    let mut session = ctx.open_session()?;
    let key = session.resolve(&args.key)?;
    let position = session.move_curve(key, &args.axis, args.position)?;
    ctx.save(&session)?;

    if ctx.json {
        output_json(&serde_json::json!({
            "key": key,
            "axis": args.axis,
            "position": position,
        }));
    } else if !ctx.quiet {
        println!("Moved {} to {} at position {}", key, args.axis, position);
    }
    Ok(())
}
