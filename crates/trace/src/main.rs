//! `trace` -- build plot layouts from raw and formula-derived series.
//!
//! Parses CLI arguments with clap, resolves the runtime context, and
//! dispatches to command handlers. Every mutating command loads the layout,
//! applies one change and saves it back.

mod cli;
mod commands;
mod context;
mod output;

use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use cli::{Cli, Commands};
use context::RuntimeContext;

/// Tracks whether a Ctrl+C has already been received.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

fn main() {
    // First Ctrl+C: exit cleanly. Second: force exit.
    let _ = ctrlc::set_handler(|| {
        if CTRLC_RECEIVED.swap(true, Ordering::SeqCst) {
            std::process::exit(1);
        }
        std::process::exit(0);
    });

    let cli = Cli::parse();
    let ctx = RuntimeContext::from_global_args(&cli.global);

    if ctx.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("trace=debug,trace_core=debug,trace_config=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match cli.command {
        Some(Commands::Version) => commands::version::run(&ctx),
        Some(Commands::Init(args)) => commands::init::run(&ctx, &args),
        Some(Commands::Add(args)) => commands::add::run(&ctx, &args),
        Some(Commands::Edit(args)) => commands::edit::run(&ctx, &args),
        Some(Commands::Rm(args)) => commands::rm::run(&ctx, &args),
        Some(Commands::Mv(args)) => commands::mv::run(&ctx, &args),
        Some(Commands::Set(args)) => commands::set::run(&ctx, &args),
        Some(Commands::Axis(args)) => commands::axis::run(&ctx, &args),
        Some(Commands::List(args)) => commands::list::run(&ctx, &args),
        Some(Commands::Eval(args)) => commands::eval::run(&ctx, &args),
        Some(Commands::Completion(args)) => commands::completion::run(&ctx, &args),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        if cli.global.json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}
