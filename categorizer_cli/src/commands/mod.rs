//! CLI subcommand implementations.

pub mod categories;
pub mod run;
pub mod sample;
