//! Company categorization engine.
//!
//! Picks the best registry record for a company name, derives a category and
//! confidence score from its industry codes (falling back to keywords), and
//! runs many such lookups concurrently behind a single-flight cache and a
//! shared registry cooldown.

pub mod cache;
pub mod categorizer;
pub mod category_map;
pub mod config;
pub mod error;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod orchestrator;
pub mod rate_limiter;
pub mod registry;
pub mod summary;

pub use brreg_api;

pub use cache::LookupCache;
pub use categorizer::{categorize, categorize_with_status};
pub use category_map::{CategoryMap, CategoryMapError};
pub use config::{CategorizerConfig, ConfigError, RegistrySettings};
pub use error::CategorizerError;
pub use matcher::select_best_match;
pub use model::{
    CandidateRecord, CategorizationMethod, CategoryAssignment, CompanyCategorization,
    Diagnostics, IndustryCode, LookupStatus, MatchResult, Resolution,
};
pub use orchestrator::{Orchestrator, Progress, StopHandle};
pub use rate_limiter::{CooldownLimiter, RequestTracker, TrackerSummary};
pub use registry::{BrregRegistry, RegistryClient, RegistryError};
pub use summary::RunSummary;
