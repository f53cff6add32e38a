// clipmine-cli/src/lib.rs
//
// Library portion of the clipmine CLI application.
// Contains argument definitions, logging setup and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands};
pub use error::{CliErrorContext, CliResult};

/// Parses the command line after loading an optional `.env` file, so that
/// its values act as environment fallbacks for credentials.
pub fn parse_cli() -> Cli {
    use clap::Parser;
    let _ = dotenvy::dotenv();
    Cli::parse()
}

/// Dispatches a parsed command line to its command.
pub fn dispatch(cli: Cli) -> CliResult<()> {
    match cli.command.clone() {
        Commands::Probe(args) => commands::probe::run_probe(args),
        Commands::Compress(args) => commands::compress::run_compress(&cli, args),
        Commands::Split(args) => commands::split::run_split(&cli, args),
        Commands::Analyze(args) => commands::analyze::run_analyze(&cli, args),
        Commands::Merge(args) => commands::merge::run_merge(&cli, args),
        Commands::Extract(args) => commands::extract::run_extract(&cli, args),
        Commands::Run(args) => commands::run::run_pipeline(&cli, args),
    }
}
