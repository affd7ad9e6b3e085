//! Typed client for the Brønnøysund Register Centre's entity search API
//! (`data.brreg.no/enhetsregisteret`).

mod client;
mod errors;
mod query;
pub mod types;

pub use self::client::{Client, DEFAULT_BASE_URL};
pub use self::errors::Error;
pub use self::query::SearchQuery;
