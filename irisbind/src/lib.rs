//! irisbind: bind a Python virtual environment to an InterSystems IRIS installation.
//!
//! Binary entry calls `run_cli()`.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use irisbind_core::config::BindConfig;
use irisbind_core::BindError;
use irisbind_env::BindOptions;

use cli::{Cli, Commands};

/// Entry point for the irisbind CLI.
pub fn run_cli() -> Result<()> {
    irisbind_core::observability::init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Bind {
            venv,
            runtime_config,
            json,
        } => {
            let cfg = BindConfig::from_env().with_cli_overrides(venv);
            commands::bind::cmd_bind(&cfg, &BindOptions { runtime_config }, json)
        }
        Commands::Unbind {
            venv,
            runtime_config,
            json,
        } => {
            let cfg = BindConfig::from_env().with_cli_overrides(venv);
            commands::bind::cmd_unbind(&cfg, &BindOptions { runtime_config }, json)
        }
        Commands::Status { venv, json } => {
            let cfg = BindConfig::from_env().with_cli_overrides(venv);
            commands::status::cmd_status(&cfg, json)
        }
    }
}

/// Process exit code for an error returned by [`run_cli`]:
/// 2 for configuration problems, 3 for filesystem failures, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<BindError>()
        .map(BindError::exit_code)
        .unwrap_or(1)
}
