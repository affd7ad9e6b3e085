//! Concurrent batch categorization.
//!
//! Uses the Semaphore + JoinSet + mpsc pattern: one task per input row waits
//! for a worker permit, resolves the name through the lookup cache, and sends
//! `(index, row)` back to the collector, which writes it into the row's slot.
//! Results therefore come back in input order whatever the completion order.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::cache::LookupCache;
use crate::categorizer::categorize_with_status;
use crate::category_map::CategoryMap;
use crate::config::CategorizerConfig;
use crate::error::CategorizerError;
use crate::matcher::select_best_match;
use crate::model::{CompanyCategorization, LookupStatus, MatchResult, Resolution};
use crate::rate_limiter::{with_retry, CooldownLimiter, TrackerSummary};
use crate::registry::RegistryClient;

/// Progress observation emitted every `progress_every` rows and at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub cache_hits: u64,
}

/// Cloneable flag that stops a run from dispatching further rows.
///
/// Rows already being resolved finish; the run then returns
/// [`CategorizerError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Everything a worker task needs, cheap to clone into each task.
struct Worker<R> {
    registry: Arc<R>,
    map: Arc<CategoryMap>,
    cache: Arc<LookupCache>,
    limiter: Arc<CooldownLimiter>,
    max_retries: u32,
    retry_base: Duration,
}

impl<R> Clone for Worker<R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            map: Arc::clone(&self.map),
            cache: Arc::clone(&self.cache),
            limiter: Arc::clone(&self.limiter),
            max_retries: self.max_retries,
            retry_base: self.retry_base,
        }
    }
}

impl<R: RegistryClient> Worker<R> {
    async fn resolve(&self, name: &str) -> CompanyCategorization {
        let resolution = self.cache.get_or_compute(name, || self.lookup(name)).await;
        CompanyCategorization {
            company_name: name.to_string(),
            assignment: resolution.assignment.clone(),
        }
    }

    async fn lookup(&self, name: &str) -> Resolution {
        let search = with_retry(&self.limiter, self.max_retries, self.retry_base, || {
            self.registry.search(name)
        })
        .await;

        let (match_result, status) = match search {
            Ok(candidates) => {
                let match_result = select_best_match(name, &candidates);
                let status = if match_result.record.is_some() {
                    LookupStatus::Matched
                } else {
                    LookupStatus::NoCandidates
                };
                (match_result, status)
            }
            Err(e) => {
                tracing::warn!("Registry lookup failed for {:?}: {}", name, e);
                (MatchResult::empty(), LookupStatus::RegistryUnavailable(e.to_string()))
            }
        };

        let assignment = categorize_with_status(name, &match_result, &self.map, status);
        Resolution {
            assignment,
            match_result,
        }
    }
}

/// Runs batches of names through registry lookup, matching and
/// categorization with bounded concurrency.
pub struct Orchestrator<R> {
    worker: Worker<R>,
    config: CategorizerConfig,
    stop: StopHandle,
    on_progress: Option<ProgressCallback>,
}

impl<R: RegistryClient + 'static> Orchestrator<R> {
    /// Validates `config` and sets up the shared cache and cooldown gate.
    pub fn new(
        registry: Arc<R>,
        map: Arc<CategoryMap>,
        config: CategorizerConfig,
    ) -> Result<Self, CategorizerError> {
        config.validate()?;
        let limiter = CooldownLimiter::new(config.cooldown_every, config.cooldown);
        Ok(Self {
            worker: Worker {
                registry,
                map,
                cache: Arc::new(LookupCache::new()),
                limiter: Arc::new(limiter),
                max_retries: config.max_retries,
                retry_base: config.retry_base,
            },
            config,
            stop: StopHandle::default(),
            on_progress: None,
        })
    }

    /// Register a progress observer.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn cache(&self) -> &LookupCache {
        &self.worker.cache
    }

    /// Registry request outcomes so far.
    pub fn request_summary(&self) -> TrackerSummary {
        self.worker.limiter.tracker().summary()
    }

    pub fn config(&self) -> &CategorizerConfig {
        &self.config
    }

    /// Categorize every name, returning one row per input in input order.
    ///
    /// Inputs larger than `chunk_threshold` run as sequential chunks of
    /// `chunk_size`, each chunk internally concurrent. Registry failures never
    /// fail the run; they show up in the row's lookup status.
    pub async fn process_all(
        &self,
        names: &[String],
    ) -> Result<Vec<CompanyCategorization>, CategorizerError> {
        let total = names.len();
        let mut slots: Vec<Option<CompanyCategorization>> = vec![None; total];
        let mut completed = 0usize;

        let chunked = total > self.config.chunk_threshold;
        let chunk_size = if chunked {
            self.config.chunk_size
        } else {
            total.max(1)
        };
        let chunk_count = total.div_ceil(chunk_size);

        tracing::info!(
            "Categorizing {} companies with {} workers",
            total,
            self.config.workers
        );

        for (chunk_index, start) in (0..total).step_by(chunk_size).enumerate() {
            if self.stop.is_stopped() {
                break;
            }
            let end = (start + chunk_size).min(total);
            if chunked {
                tracing::info!(
                    "Processing chunk {}/{} (rows {}-{})",
                    chunk_index + 1,
                    chunk_count,
                    start + 1,
                    end
                );
            }
            self.run_chunk(names, start..end, &mut slots, &mut completed, total)
                .await?;
        }

        if completed < total {
            tracing::warn!("Run stopped after {} of {} companies", completed, total);
            return Err(CategorizerError::Cancelled { completed, total });
        }
        if total == 0 || completed % self.config.progress_every != 0 {
            self.report(completed, total);
        }

        tracing::info!(
            "Categorized {} companies ({} unique lookups, {} cache hits)",
            total,
            self.worker.cache.len(),
            self.worker.cache.hits()
        );
        Ok(slots.into_iter().flatten().collect())
    }

    async fn run_chunk(
        &self,
        names: &[String],
        rows: Range<usize>,
        slots: &mut [Option<CompanyCategorization>],
        completed: &mut usize,
        total: usize,
    ) -> Result<(), CategorizerError> {
        let workers = self.config.workers;
        let semaphore = Arc::new(Semaphore::new(workers));
        let (tx, mut rx) = mpsc::channel::<(usize, CompanyCategorization)>(workers * 2);
        let mut join_set = JoinSet::new();

        for index in rows {
            let sem = Arc::clone(&semaphore);
            let sender = tx.clone();
            let worker = self.worker.clone();
            let stop = self.stop.clone();
            let name = names[index].clone();

            join_set.spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return;
                };
                if stop.is_stopped() {
                    return;
                }
                let row = worker.resolve(&name).await;
                let _ = sender.send((index, row)).await;
            });
        }
        drop(tx);

        while let Some((index, row)) = rx.recv().await {
            slots[index] = Some(row);
            *completed += 1;
            if *completed % self.config.progress_every == 0 {
                self.report(*completed, total);
            }
        }

        while let Some(joined) = join_set.join_next().await {
            if let Err(e) = joined {
                return Err(CategorizerError::Worker(e.to_string()));
            }
        }
        Ok(())
    }

    fn report(&self, completed: usize, total: usize) {
        let progress = Progress {
            completed,
            total,
            cache_hits: self.worker.cache.hits(),
        };
        tracing::info!(
            "Progress: {}/{} ({} cache hits)",
            progress.completed,
            progress.total,
            progress.cache_hits
        );
        if let Some(callback) = &self.on_progress {
            callback(progress);
        }
    }
}
