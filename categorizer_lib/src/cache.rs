//! Run-scoped lookup cache with single-flight computation per name.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::model::Resolution;
use crate::normalize::cache_key;

/// Concurrent cache from normalized company name to its resolution.
///
/// Each key owns a `OnceCell`, so concurrent requests for the same name await
/// one computation while requests for other names proceed independently.
/// Entries are never evicted during a run. A computation that is cancelled
/// before finishing leaves the cell empty and the next requester recomputes.
#[derive(Default)]
pub struct LookupCache {
    store: DashMap<String, Arc<OnceCell<Arc<Resolution>>>>,
    lookups: AtomicU64,
    misses: AtomicU64,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached resolution for `name`, computing it at most once.
    pub async fn get_or_compute<F, Fut>(&self, name: &str, compute: F) -> Arc<Resolution>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Resolution>,
    {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let cell = self
            .store
            .entry(cache_key(name))
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let misses = &self.misses;
        cell.get_or_init(|| async move {
            misses.fetch_add(1, Ordering::Relaxed);
            Arc::new(compute().await)
        })
        .await
        .clone()
    }

    /// Returns the cached resolution without computing.
    #[cfg(test)]
    fn get(&self, name: &str) -> Option<Arc<Resolution>> {
        let cell = self.store.get(&cache_key(name))?.clone();
        cell.get().cloned()
    }

    /// Number of completed entries.
    pub fn len(&self) -> usize {
        self.store.iter().filter(|entry| entry.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookups answered without running a computation.
    pub fn hits(&self) -> u64 {
        self.lookups
            .load(Ordering::Relaxed)
            .saturating_sub(self.misses.load(Ordering::Relaxed))
    }

    /// Lookups that ran a computation.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CategorizationMethod, CategoryAssignment, Diagnostics, LookupStatus, MatchResult,
        UNCATEGORIZED,
    };
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn resolution(label: &str) -> Resolution {
        Resolution {
            assignment: CategoryAssignment {
                category: label.to_string(),
                category_id: 0,
                subsegment: UNCATEGORIZED.to_string(),
                confidence: 0.1,
                method: CategorizationMethod::None,
                diagnostics: Diagnostics {
                    matched_code: None,
                    matched_code_description: None,
                    matching_keywords: Vec::new(),
                    candidate_count: 0,
                    skipped_malformed: 0,
                    exact_name_match: false,
                    selected_company: None,
                    org_number: None,
                    industry_code_count: 0,
                    name_similarity: 0.0,
                    lookup_status: LookupStatus::NoCandidates,
                },
            },
            match_result: MatchResult::empty(),
        }
    }

    #[tokio::test]
    async fn cache_computes_once_per_key() {
        let cache = LookupCache::new();
        let first = cache
            .get_or_compute("Equinor ASA", || async { resolution("first") })
            .await;
        let second = cache
            .get_or_compute("  equinor   asa ", || async { resolution("second") })
            .await;
        assert_eq!(first.assignment.category, "first");
        assert_eq!(second.assignment.category, "first");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
    }

    #[tokio::test]
    async fn cache_distinct_keys() {
        let cache = LookupCache::new();
        cache.get_or_compute("Equinor", || async { resolution("a") }).await;
        cache.get_or_compute("Rema 1000", || async { resolution("b") }).await;
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("REMA 1000").unwrap().assignment.category, "b");
        assert!(cache.get("Elkjøp").is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cache_single_flight_under_contention() {
        let cache = Arc::new(LookupCache::new());
        let computations = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let computations = Arc::clone(&computations);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute("H&M", || async move {
                        computations.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        resolution("fashion")
                    })
                    .await
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(computations.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 15);
    }

    #[tokio::test]
    async fn cancelled_computation_leaves_no_entry() {
        let cache = LookupCache::new();
        let pending = cache.get_or_compute("Slow AS", || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            resolution("never")
        });
        let timed_out = tokio::time::timeout(Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());
        assert!(cache.is_empty());
        assert!(cache.get("Slow AS").is_none());

        let value = cache
            .get_or_compute("Slow AS", || async { resolution("second try") })
            .await;
        assert_eq!(value.assignment.category, "second try");
    }
}
