//! Bundlemock CLI Library
//!
//! Command-line inspection of a bundled test suite: which modules are mocked
//! by default, which manual mocks get linked, and whether the mocking
//! configuration is valid.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

mod commands;
mod config;
mod error;
pub mod handlers;

pub use commands::{
    CheckConfigArgs, Cli, ColorArg, Commands, ExplainArgs, ManualMocksArgs, OutputFormatArg,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
