//! `trace eval` -- evaluate a curve against sample values.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use trace_core::{CurveKey, PlotSession};

use crate::cli::EvalArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `trace eval` command.
pub fn run(ctx: &RuntimeContext, args: &EvalArgs) -> Result<()> {
    let session = ctx.open_session()?;
    let key = session.resolve(&args.key)?;
    let samples = parse_samples(&session, &args.samples)?;
    let value = session.evaluate(key, &samples)?;

    if ctx.json {
        output_json(&serde_json::json!({ "key": key, "value": value }));
    } else {
        println!("{} = {}", key, value);
    }
    Ok(())
}

/// Parse `KEY=VALUE` pairs, checking each key names a curve.
fn parse_samples(session: &PlotSession, pairs: &[String]) -> Result<HashMap<CurveKey, f64>> {
    let mut samples = HashMap::new();
    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("invalid sample '{}' (expected KEY=VALUE)", pair);
        };
        let key = session.resolve(name.trim())?;
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("invalid number in sample '{}'", pair))?;
        samples.insert(key, value);
    }
    Ok(samples)
}
