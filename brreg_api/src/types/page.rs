use serde::{Deserialize, Serialize};

use super::Enhet;

/// Envelope returned by `/enheter`. The `_embedded` object is omitted
/// entirely when the search has zero hits.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct SearchResponse {
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<Embedded>,
    #[serde(default)]
    pub page: Option<PageInfo>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Embedded {
    #[serde(default)]
    pub enheter: Vec<Enhet>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub number: u32,
}

impl SearchResponse {
    /// Consumes the envelope and returns the hits in API order.
    pub fn into_enheter(self) -> Vec<Enhet> {
        self.embedded.map(|e| e.enheter).unwrap_or_default()
    }

    /// Total hits reported by the registry, or the embedded count if the
    /// page block is missing.
    pub fn total_elements(&self) -> u64 {
        match (&self.page, &self.embedded) {
            (Some(page), _) => page.total_elements,
            (None, Some(embedded)) => embedded.enheter.len() as u64,
            (None, None) => 0,
        }
    }
}
