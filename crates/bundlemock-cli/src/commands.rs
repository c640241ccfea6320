//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Bundlemock: inspect how a bundled test suite resolves modules and mocks
#[derive(Parser, Debug)]
#[command(name = "bundlemock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the default mock decision for every bundled module
    Explain(ExplainArgs),

    /// List the manual mocks that would be linked
    ManualMocks(ManualMocksArgs),

    /// Validate the mocking configuration
    CheckConfig(CheckConfigArgs),
}

/// Arguments for the explain command
#[derive(Parser, Debug)]
pub struct ExplainArgs {
    /// Project config (`package.json` or YAML)
    #[arg(short, long, default_value = "package.json")]
    pub config: PathBuf,

    /// Bundle stats file (defaults to the configured `statsPath`)
    #[arg(short, long)]
    pub stats: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormatArg,
}

/// Arguments for the manual-mocks command
#[derive(Parser, Debug)]
pub struct ManualMocksArgs {
    /// Project config (`package.json` or YAML)
    #[arg(short, long, default_value = "package.json")]
    pub config: PathBuf,

    /// Bundle stats file (defaults to the configured `statsPath`)
    #[arg(short, long)]
    pub stats: Option<PathBuf>,

    /// Project root for package mocks (defaults to the config's directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormatArg,
}

/// Arguments for the check-config command
#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    /// Project config (`package.json` or YAML)
    #[arg(short, long, default_value = "package.json")]
    pub config: PathBuf,
}

/// Output format argument
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON document
    Json,
}

/// Color argument
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Detect terminal
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}
