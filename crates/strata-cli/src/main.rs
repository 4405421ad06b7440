//! Strata CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, debug, info};

use strata_cli::{Args, error_adapter::render_reports};

fn main() -> ExitCode {
    miette::set_panic_hook();

    let args = Args::parse();
    init_logger(&args.log_level);
    debug!(args:?; "Parsed arguments");

    match strata_cli::run(&args) {
        Ok(()) => {
            info!(output = args.output; "Completed successfully");
            ExitCode::SUCCESS
        }
        Err(err) => {
            // Straight to stderr so `--log-level off` still shows why the run failed
            eprintln!("{}", render_reports(&err));
            ExitCode::FAILURE
        }
    }
}

/// Installs `env_logger` at `level`, falling back to `warn` for unknown names.
fn init_logger(level: &str) {
    let filter = level.parse::<LevelFilter>().unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(filter)
        .init();

    info!(log_level:? = filter; "Starting Strata");
}
