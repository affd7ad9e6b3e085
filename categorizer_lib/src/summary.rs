//! End-of-run statistics.

use std::collections::BTreeMap;

use crate::cache::LookupCache;
use crate::model::{CategorizationMethod, CompanyCategorization};
use crate::rate_limiter::TrackerSummary;

pub const HIGH_CONFIDENCE: f64 = 0.8;
pub const MEDIUM_CONFIDENCE: f64 = 0.5;

/// Distribution of a run's results plus cache and registry counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_method: BTreeMap<CategorizationMethod, usize>,
    /// Confidence >= 0.8.
    pub high_confidence: usize,
    /// Confidence in [0.5, 0.8).
    pub medium_confidence: usize,
    /// Confidence < 0.5.
    pub low_confidence: usize,
    pub average_confidence: f64,
    pub categorized_by_code: usize,
    /// Rows whose registry lookup did not produce a match.
    pub needs_review: usize,
    pub unique_lookups: usize,
    pub cache_hits: u64,
    pub requests: TrackerSummary,
}

impl RunSummary {
    pub fn from_rows(rows: &[CompanyCategorization]) -> Self {
        let mut summary = Self {
            total: rows.len(),
            ..Default::default()
        };
        let mut confidence_sum = 0.0;

        for row in rows {
            let a = &row.assignment;
            *summary.by_category.entry(a.category.clone()).or_default() += 1;
            *summary.by_method.entry(a.method).or_default() += 1;
            confidence_sum += a.confidence;

            if a.confidence >= HIGH_CONFIDENCE {
                summary.high_confidence += 1;
            } else if a.confidence >= MEDIUM_CONFIDENCE {
                summary.medium_confidence += 1;
            } else {
                summary.low_confidence += 1;
            }
            if a.categorized_by_code() {
                summary.categorized_by_code += 1;
            }
            if a.diagnostics.needs_review() {
                summary.needs_review += 1;
            }
        }

        if !rows.is_empty() {
            summary.average_confidence = confidence_sum / rows.len() as f64;
        }
        summary
    }

    pub fn with_cache(mut self, cache: &LookupCache) -> Self {
        self.unique_lookups = cache.len();
        self.cache_hits = cache.hits();
        self
    }

    pub fn with_requests(mut self, requests: TrackerSummary) -> Self {
        self.requests = requests;
        self
    }

    /// Categories, most frequent first; ties by name.
    pub fn categories_by_count(&self) -> Vec<(&str, usize)> {
        let mut out: Vec<(&str, usize)> = self
            .by_category
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        out
    }

    /// Share of `count` in the run, as a percentage.
    pub fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total as f64
        }
    }
}
