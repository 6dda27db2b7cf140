//! Output formatting helpers for the `trace` CLI.

use std::io::{self, Write};

use serde::Serialize;
use trace_core::{Curve, PlotSession};
use trace_ui::styles::{render_axis_header, render_curve_line, render_muted, tree_prefix};
use trace_ui::terminal::terminal_width;

/// Print a value as pretty-printed JSON to stdout.
///
/// Terminates the process with exit code 1 if serialization fails.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print a simple table with headers and rows.
///
/// Column widths are computed from the data for alignment.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    let header: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<width$}", h, width = widths[i]))
        .collect();
    let _ = writeln!(handle, "{}", header.join("  ").trim_end());

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(handle, "{}", separator.join("  "));

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| match widths.get(i) {
                Some(w) => format!("{:<width$}", cell, width = *w),
                None => cell.clone(),
            })
            .collect();
        let _ = writeln!(handle, "{}", cells.join("  ").trim_end());
    }
}

/// Format a curve as a row for flat list output.
pub fn format_curve_row(curve: &Curve, axis_name: &str) -> Vec<String> {
    let flag = |on: bool| if on { "yes" } else { "no" }.to_string();
    vec![
        curve.key().to_string(),
        axis_name.to_string(),
        curve.color().to_string(),
        flag(curve.active),
        flag(curve.use_live_data),
        flag(curve.use_archive_data),
        curve.text().to_string(),
    ]
}

/// Columns taken by everything on a curve line except its text.
const CURVE_LINE_OVERHEAD: usize = 40;

/// Render the session as a tree: one header per axis, one line per curve.
///
/// On a terminal, long addresses and formulas are shortened to fit.
pub fn format_tree(session: &PlotSession) -> Vec<String> {
    let max_text = terminal_width().map(|w| w.saturating_sub(CURVE_LINE_OVERHEAD).max(16));
    let mut lines = Vec::new();
    for axis in session.axes().iter() {
        lines.push(render_axis_header(axis));
        let keys = axis.curves();
        if keys.is_empty() {
            lines.push(format!("  {}", render_muted("(no curves)")));
        }
        for (i, key) in keys.iter().enumerate() {
            if let Some(curve) = session.curve(*key) {
                lines.push(format!(
                    "  {}{}",
                    render_muted(tree_prefix(i, keys.len())),
                    render_curve_line(curve, max_text)
                ));
            }
        }
    }
    lines
}
