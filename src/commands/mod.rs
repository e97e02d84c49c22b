//! CLI command implementations for herakles-usage-sampler.
//!
//! This module provides implementations for all CLI subcommands:
//! - `monitor`: Periodic sampling of one process (default)
//! - `load`: Sampling of this process under synthetic load
//! - `check`: System validation
//! - `config`: Configuration file generation

pub mod check;
pub mod config;
pub mod load;
pub mod monitor;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use load::command_load;
pub use monitor::command_monitor;
