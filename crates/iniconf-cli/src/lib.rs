//! iniconf CLI library
//!
//! Exposes the CLI entry point so the `iniconf` binary stays a thin wrapper.

mod cli;

pub use cli::run;
