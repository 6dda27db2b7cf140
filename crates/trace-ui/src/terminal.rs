//! Terminal detection and width fitting.

use std::env;

/// Returns `true` if stdout is connected to a terminal (TTY).
pub fn is_tty() -> bool {
    crossterm::tty::IsTty::is_tty(&std::io::stdout())
}

/// Width of the attached terminal in columns, or `None` when stdout is not
/// a terminal (output piped to a file is never truncated).
pub fn terminal_width() -> Option<usize> {
    if !is_tty() {
        return None;
    }
    crossterm::terminal::size()
        .ok()
        .map(|(cols, _rows)| cols as usize)
}

/// Determines if ANSI color codes should be used.
///
/// `NO_COLOR`, `CLICOLOR=0` and `TERM=dumb` disable color;
/// `CLICOLOR_FORCE` enables it off a TTY.
pub fn supports_color() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if env::var("CLICOLOR").as_deref() == Ok("0") {
        return false;
    }
    if env::var("TERM").as_deref() == Ok("dumb") {
        return false;
    }
    if env::var_os("CLICOLOR_FORCE").is_some() {
        return true;
    }
    is_tty()
}

/// Shorten `text` to at most `max` characters, ending in `…` when cut.
pub fn fit_width(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('\u{2026}');
    out
}
