//! Terminal UI components for trace.
//!
//! Provides terminal detection and Ayu-themed styling for printing axes and
//! curves, with each curve drawn in its own plot color.

pub mod styles;
pub mod terminal;
