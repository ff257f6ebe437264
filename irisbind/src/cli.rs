use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// irisbind - use InterSystems IRIS embedded Python from a standard virtual environment
#[derive(Parser, Debug)]
#[command(name = "irisbind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Make the IRIS embedded runtime importable from the virtual environment
    ///
    /// Reads the installation from IRISINSTALLDIR (or ISC_PACKAGE_INSTALLDIR) and the
    /// environment from VIRTUAL_ENV, then writes iris_embedded.pth into its site-packages.
    /// Running it again is safe.
    Bind {
        /// Virtual environment root (default: $VIRTUAL_ENV)
        #[arg(long, value_name = "DIR")]
        venv: Option<PathBuf>,

        /// Also write a CPF merge file pointing the IRIS instance at this environment's
        /// interpreter (IRIS 2024.1+; backs up iris.cpf first)
        #[arg(long, default_value = "false")]
        runtime_config: bool,

        /// Print the result as JSON on stdout
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Remove the linkage written by `bind`. Succeeds when nothing is bound.
    Unbind {
        /// Virtual environment root (default: $VIRTUAL_ENV)
        #[arg(long, value_name = "DIR")]
        venv: Option<PathBuf>,

        /// Also restore the IRIS Python settings saved by `bind --runtime-config`
        #[arg(long, default_value = "false")]
        runtime_config: bool,

        /// Print the result as JSON on stdout
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show installation, environment and linkage state
    Status {
        /// Virtual environment root (default: $VIRTUAL_ENV)
        #[arg(long, value_name = "DIR")]
        venv: Option<PathBuf>,

        /// Output as structured JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bind_flags() {
        let cli = Cli::try_parse_from(["irisbind", "bind", "--venv", "/tmp/v", "--runtime-config"])
            .unwrap();
        match cli.command {
            Commands::Bind {
                venv,
                runtime_config,
                json,
            } => {
                assert_eq!(venv, Some(PathBuf::from("/tmp/v")));
                assert!(runtime_config);
                assert!(!json);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unbind_takes_no_positional_args() {
        assert!(Cli::try_parse_from(["irisbind", "unbind", "extra"]).is_err());
    }
}
