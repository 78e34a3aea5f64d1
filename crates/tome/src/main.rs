//! Tome CLI - static documentation site generator.
//!
//! Provides commands for:
//! - `build`: Render the site into the output directory
//! - `serve`: Build, watch for changes and serve the site locally

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, ServeArgs};
use error::CliError;
use output::Output;

/// Tome - static documentation site generator.
#[derive(Parser)]
#[command(name = "tome", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the documentation site.
    Build(BuildArgs),
    /// Build, watch and serve the site with live reload.
    Serve(ServeArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Build(args) => args.verbose,
            Self::Serve(args) => args.verbose,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::Serve(args) => tokio::runtime::Runtime::new()
            .map_err(CliError::from)
            .and_then(|rt| rt.block_on(args.execute())),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from(["tome", "build", "-c", "tome.yml", "--clean", "-v"]).unwrap();
        assert!(cli.command.verbose());
        assert!(matches!(cli.command, Commands::Build(_)));
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["tome", "serve", "--host", "0.0.0.0", "-p", "9000"]).unwrap();
        assert!(!cli.command.verbose());
        assert!(matches!(cli.command, Commands::Serve(_)));
    }

    #[test]
    fn test_rejects_invalid_port() {
        assert!(Cli::try_parse_from(["tome", "serve", "-p", "http"]).is_err());
    }
}
