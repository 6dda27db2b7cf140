//! Ayu color theme and rendering of axes and curves.
//!
//! Semantic colors come from the Ayu Dark palette. Curves are the exception:
//! their swatch is drawn in the curve's own plot color so the listing matches
//! the plot.

use owo_colors::OwoColorize;
use trace_core::{Axis, Color, Curve};

use crate::terminal::{fit_width, supports_color};

// ---------------------------------------------------------------------------
// Ayu Dark color palette (RGB values)
// ---------------------------------------------------------------------------

const PASS: (u8, u8, u8) = (0xc2, 0xd9, 0x4c); // #c2d94c - bright green
const WARN: (u8, u8, u8) = (0xff, 0xb4, 0x54); // #ffb454 - bright yellow
const FAIL: (u8, u8, u8) = (0xf0, 0x71, 0x78); // #f07178 - bright red
const MUTED: (u8, u8, u8) = (0x6c, 0x76, 0x80); // #6c7680 - muted gray
const ACCENT: (u8, u8, u8) = (0x59, 0xc2, 0xff); // #59c2ff - bright blue
const FORMULA: (u8, u8, u8) = (0xd2, 0xa6, 0xff); // #d2a6ff - purple

// ---------------------------------------------------------------------------
// Icons
// ---------------------------------------------------------------------------

/// Curve swatch, drawn in the curve's color.
pub const SWATCH: &str = "\u{25A0}"; // ■
/// Marker for a hidden axis or inactive curve.
pub const ICON_HIDDEN: &str = "\u{25CB}"; // ○

pub const ICON_PASS: &str = "\u{2713}"; // ✓
pub const ICON_WARN: &str = "\u{26A0}"; // ⚠
pub const ICON_FAIL: &str = "\u{2716}"; // ✖

// Tree characters for the axis/curve listing
pub const TREE_CHILD: &str = "\u{251C}\u{2500} "; // ├─
pub const TREE_LAST: &str = "\u{2514}\u{2500} "; // └─

// ---------------------------------------------------------------------------
// Helper: apply truecolor only when color is supported
// ---------------------------------------------------------------------------

fn color_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).to_string()
    } else {
        s.to_string()
    }
}

fn color_bold_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).bold().to_string()
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Semantic render helpers
// ---------------------------------------------------------------------------

pub fn render_warn(s: &str) -> String {
    color_str(s, WARN)
}

pub fn render_muted(s: &str) -> String {
    color_str(s, MUTED)
}

pub fn render_pass_icon() -> String {
    color_str(ICON_PASS, PASS)
}

pub fn render_warn_icon() -> String {
    color_str(ICON_WARN, WARN)
}

pub fn render_fail_icon() -> String {
    color_str(ICON_FAIL, FAIL)
}

// ---------------------------------------------------------------------------
// Plot rendering
// ---------------------------------------------------------------------------

/// A swatch in the given plot color. Without color support this is the
/// `#rrggbb` code instead.
pub fn render_swatch(color: Color) -> String {
    if supports_color() {
        SWATCH.truecolor(color.r, color.g, color.b).to_string()
    } else {
        color.to_string()
    }
}

/// Axis header line: bold name, range, and a hidden marker.
pub fn render_axis_header(axis: &Axis) -> String {
    let range = if axis.auto_range {
        "auto".to_string()
    } else {
        format!("{} .. {}", axis.min_range, axis.max_range)
    };
    let mut line = format!(
        "{} {}",
        color_bold_str(axis.name(), ACCENT),
        render_muted(&format!("[{}]", range))
    );
    if !axis.visible() {
        line.push(' ');
        line.push_str(&render_muted(&format!("{} hidden", ICON_HIDDEN)));
    }
    line
}

/// Data-source flags as a compact tag, e.g. `live+archive`.
pub fn render_sources(curve: &Curve) -> String {
    let sources: Vec<&str> = [
        (curve.use_live_data, "live"),
        (curve.use_archive_data, "archive"),
    ]
    .iter()
    .filter(|(on, _)| *on)
    .map(|(_, name)| *name)
    .collect();
    if sources.is_empty() {
        render_warn("no data")
    } else {
        render_muted(&sources.join("+"))
    }
}

/// One curve line: swatch, key, text and flags.
///
/// Formula text is purple; inactive curves are dimmed; a pending edit is
/// flagged. `max_text` caps the width of the address or formula.
pub fn render_curve_line(curve: &Curve, max_text: Option<usize>) -> String {
    let raw = match max_text {
        Some(max) => fit_width(curve.text(), max),
        None => curve.text().to_string(),
    };
    let text = if !curve.active {
        render_muted(&raw)
    } else if curve.is_formula() {
        color_str(&raw, FORMULA)
    } else {
        raw
    };
    let mut line = format!(
        "{} {} {} {}",
        render_swatch(curve.color()),
        color_bold_str(&curve.key().to_string(), ACCENT),
        text,
        render_sources(curve),
    );
    if !curve.active {
        line.push(' ');
        line.push_str(&render_muted(ICON_HIDDEN));
    }
    if curve.edit_pending() {
        line.push(' ');
        line.push_str(&render_warn("(edit pending)"));
    }
    line
}

/// The tree prefix for child `index` of `len`.
pub fn tree_prefix(index: usize, len: usize) -> &'static str {
    if index + 1 == len { TREE_LAST } else { TREE_CHILD }
}
