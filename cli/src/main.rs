mod check;
mod display;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use catlint_config::ConfigLocations;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Live diagnostics for CatLua files.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of ~/.catlint/config.toml and .catlint.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a file once and print its diagnostics. Exits with 1 on errors.
    Check { file: PathBuf },
    /// Re-analyse files whenever they change on disk, until interrupted.
    Watch {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// How often to look for modifications, in milliseconds
        #[arg(long, default_value_t = 250)]
        poll_ms: u64,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // Stdout carries diagnostics; logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let locations = match cli.config {
        Some(path) => {
            let locations = ConfigLocations::explicit(&path);
            locations
                .load(None)
                .with_context(|| format!("unusable config file {}", path.display()))?;
            locations
        }
        None => ConfigLocations::discover(),
    };

    match cli.command {
        Command::Check { file } => check::run(locations, &file).await,
        Command::Watch { files, poll_ms } => {
            watch::run(locations, &files, Duration::from_millis(poll_ms.max(1))).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["catlint", "check", "door.cat", "--config", "c.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert!(matches!(cli.command, Command::Check { file } if file == PathBuf::from("door.cat")));
    }

    #[test]
    fn watch_requires_files() {
        assert!(Cli::try_parse_from(["catlint", "watch"]).is_err());

        let cli = Cli::try_parse_from(["catlint", "watch", "a.cat", "b.cat"]).unwrap();
        let Command::Watch { files, poll_ms } = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(files.len(), 2);
        assert_eq!(poll_ms, 250);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
