//! Run-level error type.
//!
//! Per-company failures never surface here; they degrade into the keyword
//! fallback and are recorded on the assignment's diagnostics instead.

use thiserror::Error;

use crate::category_map::CategoryMapError;
use crate::config::ConfigError;
use crate::registry::RegistryError;

/// Errors that abort a categorization run.
#[derive(Error, Debug)]
pub enum CategorizerError {
    /// The category table could not be loaded or failed validation.
    #[error("Category map error: {0}")]
    CategoryMap(#[from] CategoryMapError),
    /// Invalid engine configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// The registry client could not be constructed.
    #[error("Registry setup failed: {0}")]
    RegistrySetup(#[from] RegistryError),
    /// The run was stopped before every company was processed.
    #[error("Run cancelled after {completed} of {total} companies")]
    Cancelled { completed: usize, total: usize },
    /// A worker task panicked or was aborted.
    #[error("Worker task failed: {0}")]
    Worker(String),
}
