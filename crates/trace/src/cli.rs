//! Clap CLI definitions for the `trace` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// trace -- build plot layouts from raw and formula-derived series.
#[derive(Parser, Debug)]
#[command(
    name = "trace",
    about = "Build plot layouts from raw and formula-derived series",
    long_about = "Curves are raw series or f:// formulas over other curves ({PV1}*2). \
                  Curves live on named axes; formulas stay acyclic.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Layout file (default: .trace/layout.json, discovered upwards).
    #[arg(long, global = true, env = "TRACE_LAYOUT")]
    pub layout: Option<PathBuf>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a .trace directory with a default config and an empty layout.
    Init(InitArgs),

    /// Add direct series or f:// formulas.
    Add(AddArgs),

    /// Change a curve's address or formula.
    Edit(EditArgs),

    /// Delete curves.
    #[command(alias = "delete")]
    Rm(RmArgs),

    /// Move a curve to another axis or position.
    #[command(alias = "move")]
    Mv(MvArgs),

    /// Set a curve's active/live/archive flags.
    Set(SetArgs),

    /// Manage axes.
    Axis(AxisArgs),

    /// Show axes and their curves.
    #[command(alias = "ls")]
    List(ListArgs),

    /// Evaluate a curve against sample values.
    Eval(EvalArgs),

    /// Generate shell completions.
    Completion(CompletionArgs),

    /// Print version information.
    Version,
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

/// Arguments for `trace init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing layout with an empty one.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Curves
// ---------------------------------------------------------------------------

/// Arguments for `trace add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Series addresses or f:// formulas.
    #[arg(required_unless_present = "from_file")]
    pub series: Vec<String>,

    /// Axis to add to (default: the last axis).
    #[arg(short = 'a', long)]
    pub axis: Option<String>,

    /// Read more series from a file, one per line ('#' starts a comment).
    #[arg(short = 'f', long)]
    pub from_file: Option<PathBuf>,
}

/// Arguments for `trace edit`.
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Curve key (e.g. PV3).
    pub key: String,

    /// New address, or new f:// formula.
    pub text: String,
}

/// Arguments for `trace rm`.
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Curve keys to delete.
    #[arg(required = true)]
    pub keys: Vec<String>,
}

/// Arguments for `trace mv`.
#[derive(Args, Debug)]
pub struct MvArgs {
    /// Curve key.
    pub key: String,

    /// Target axis name.
    pub axis: String,

    /// Position within the target axis (default: end).
    #[arg(short = 'p', long)]
    pub position: Option<usize>,
}

/// Arguments for `trace set`.
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Curve key.
    pub key: String,

    /// Show or hide the curve.
    #[arg(long)]
    pub active: Option<bool>,

    /// Request live data.
    #[arg(long)]
    pub live: Option<bool>,

    /// Request archived data.
    #[arg(long)]
    pub archive: Option<bool>,
}

// ---------------------------------------------------------------------------
// Axes
// ---------------------------------------------------------------------------

/// Arguments for `trace axis`.
#[derive(Args, Debug)]
pub struct AxisArgs {
    #[command(subcommand)]
    pub command: AxisCommands,
}

/// Axis subcommands.
#[derive(Subcommand, Debug)]
pub enum AxisCommands {
    /// Add an axis (auto-named when no name is given).
    Add {
        /// Axis name.
        name: Option<String>,
    },

    /// Close an axis and delete its curves.
    Rm {
        /// Axis name.
        name: String,
    },

    /// Rename an axis.
    Rename {
        /// Current name.
        old: String,
        /// New name.
        new: String,
    },

    /// Set a manual range, or return to auto-range.
    Range(RangeArgs),

    /// Show an axis and activate its curves.
    Show {
        /// Axis name.
        name: String,
    },

    /// Hide an axis and deactivate its curves.
    Hide {
        /// Axis name.
        name: String,
    },
}

/// Arguments for `trace axis range`.
#[derive(Args, Debug)]
pub struct RangeArgs {
    /// Axis name.
    pub name: String,

    /// Return to auto-range.
    #[arg(long, conflicts_with_all = ["min", "max"])]
    pub auto: bool,

    /// Lower bound.
    #[arg(long, allow_negative_numbers = true, requires = "max")]
    pub min: Option<f64>,

    /// Upper bound.
    #[arg(long, allow_negative_numbers = true, requires = "min")]
    pub max: Option<f64>,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Arguments for `trace list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// One row per curve instead of a tree.
    #[arg(long)]
    pub flat: bool,
}

/// Arguments for `trace eval`.
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Curve key.
    pub key: String,

    /// Sample value for a direct curve, as KEY=VALUE. Repeatable.
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    pub samples: Vec<String>,
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Arguments for `trace completion`.
#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommands,
}

/// Completion subcommands.
#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    /// Generate Bash completions.
    Bash,
    /// Generate Zsh completions.
    Zsh,
    /// Generate Fish completions.
    Fish,
    /// Generate PowerShell completions.
    Powershell,
}
