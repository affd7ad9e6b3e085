//! Registry seam: the trait the orchestrator talks to and its BRREG adapter.

use async_trait::async_trait;
use brreg_api::types::Enhet;
use brreg_api::SearchQuery;
use thiserror::Error;

use crate::config::RegistrySettings;
use crate::model::{CandidateRecord, IndustryCode};

/// Failures of a registry search, reduced to what the engine acts on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Registry unreachable: {0}")]
    Network(String),
    #[error("Registry resource not found")]
    NotFound,
    #[error("Rate limited by registry")]
    RateLimited,
    #[error("Invalid registry response: {0}")]
    InvalidResponse(String),
}

impl From<brreg_api::Error> for RegistryError {
    fn from(err: brreg_api::Error) -> Self {
        match err {
            brreg_api::Error::RateLimited => Self::RateLimited,
            brreg_api::Error::NotFound => Self::NotFound,
            brreg_api::Error::Network(e) => Self::Network(e.to_string()),
            brreg_api::Error::InvalidUrl(msg) => Self::Network(format!("invalid URL: {}", msg)),
            brreg_api::Error::HttpStatus { status, .. } if status >= 500 => {
                Self::Network(format!("HTTP {}", status))
            }
            brreg_api::Error::HttpStatus { status, body } => {
                Self::InvalidResponse(format!("HTTP {}: {}", status, body))
            }
            brreg_api::Error::Parse(msg) => Self::InvalidResponse(msg),
        }
    }
}

/// Name search against an authoritative company registry.
///
/// Implementations must be safe to share across worker tasks.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Candidate records for `name`, in registry relevance order.
    async fn search(&self, name: &str) -> Result<Vec<CandidateRecord>, RegistryError>;
}

/// [`RegistryClient`] backed by the Enhetsregisteret search API.
pub struct BrregRegistry {
    client: brreg_api::Client,
    search_size: u32,
}

impl BrregRegistry {
    pub fn new(client: brreg_api::Client, search_size: u32) -> Self {
        Self {
            client,
            search_size,
        }
    }

    /// Build a client from endpoint settings.
    pub fn from_settings(settings: &RegistrySettings, search_size: u32) -> Result<Self, RegistryError> {
        let client = brreg_api::Client::with_options(&settings.base_url, settings.verify_tls)?;
        Ok(Self::new(client, search_size))
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait]
impl RegistryClient for BrregRegistry {
    async fn search(&self, name: &str) -> Result<Vec<CandidateRecord>, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Vec::new());
        }
        let query = SearchQuery::by_name(name).with_size(self.search_size);
        let response = self.client.search_enheter(&query).await?;
        tracing::debug!(
            "Registry returned {} of {} hits for {:?}",
            response
                .embedded
                .as_ref()
                .map_or(0, |e| e.enheter.len()),
            response.total_elements(),
            name
        );
        Ok(response
            .into_enheter()
            .into_iter()
            .map(candidate_from_enhet)
            .collect())
    }
}

/// Map a registry entity onto the engine's candidate shape.
///
/// Records with a blank name or organisation number are passed through
/// unchanged; the matcher skips and counts them.
pub fn candidate_from_enhet(enhet: Enhet) -> CandidateRecord {
    let active = enhet.is_active();
    let industry_codes = enhet
        .naeringskoder()
        .into_iter()
        .map(|nk| IndustryCode::new(&nk.kode, &nk.beskrivelse))
        .collect();
    let activities = enhet
        .activity_texts()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();

    CandidateRecord {
        org_number: enhet.organisasjonsnummer.trim().to_string(),
        name: enhet.navn.trim().to_string(),
        active,
        industry_codes,
        org_form: enhet.organisasjonsform.map(|f| f.kode),
        activities,
    }
}
