//! Configuration management for trace.
//!
//! This crate handles loading and saving `.trace/config.yaml`, layering it
//! with `TRACE_*` environment overrides, and discovering `.trace/`
//! directories in the filesystem.

pub mod config;
pub mod trace_dir;

pub use config::{ConfigError, TraceConfig, config_sources, load_config, save_config};
pub use trace_dir::{ensure_trace_dir, find_trace_dir, find_trace_dir_or_error};
