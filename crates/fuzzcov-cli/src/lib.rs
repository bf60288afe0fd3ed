//! fuzzcov CLI Library
//!
//! Command-line interface for fuzzcov: aggregation passes, the build mode
//! gate and report patching.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;

pub use commands::{
    AggregateArgs, BuildArgs, Cli, ColorArg, Commands, ConfigArgs, GateArgs, PatchArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::init_tracing;
