//! Bundlemock CLI: inspect mock resolution for bundled tests
//!
//! ## Usage
//!
//! ```bash
//! bundlemock explain --config package.json            # Default mock decision per module
//! bundlemock explain --format json                    # Same, as JSON
//! bundlemock manual-mocks --stats out/stats.json      # Manual mocks that would be linked
//! bundlemock check-config --config bundlemock.yaml    # Validate patterns and options
//! ```

use bundlemock_cli::{handlers, Cli, CliConfig, CliResult, Commands};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = CliConfig::from_cli(&cli);
    init_tracing(&config);
    console::set_colors_enabled(config.color.should_color());

    let output = match &cli.command {
        Commands::Explain(args) => handlers::execute_explain(args)?,
        Commands::ManualMocks(args) => handlers::execute_manual_mocks(args)?,
        Commands::CheckConfig(args) => handlers::execute_check_config(args)?,
    };

    if !config.verbosity.is_quiet() {
        println!("{output}");
    }
    Ok(())
}

fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
