//! CLI subcommand implementations.

pub mod check;
pub mod clear_cache;
pub mod output;
