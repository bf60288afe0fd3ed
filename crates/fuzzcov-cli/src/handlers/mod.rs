//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains the execution logic for one CLI command,
//! its pure helpers and their tests.

pub mod aggregate;
pub mod build;
pub mod config;
pub mod gate;
pub mod patch;

pub use aggregate::execute_aggregate;
pub use build::execute_build;
pub use config::execute_config;
pub use gate::execute_gate;
pub use patch::execute_patch;
