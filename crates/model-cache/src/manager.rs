use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use log::{debug, error, info, warn};
use tokio::sync::broadcast;

use crate::state::{Claim, Outcome, OutcomeReceiver, OutcomeSender};
use crate::{
    CacheError, CacheState, LanguagePair, ModelBackend, ModelCatalog, ModelEvent, ModelHandle,
    ModelRecord, ModelStatus,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Per-pair outcome of a batch download.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub succeeded: Vec<LanguagePair>,
    pub failed: Vec<(LanguagePair, CacheError)>,
}

impl DownloadSummary {
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// True when no requested pair failed
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Resolves language pairs to installed models, downloading on demand.
///
/// Cloning is cheap; clones share the same catalog, state and backend.
#[derive(Clone)]
pub struct ModelCacheManager {
    backend: Arc<dyn ModelBackend>,
    catalog: Arc<ModelCatalog>,
    state: Arc<CacheState>,
    events: broadcast::Sender<ModelEvent>,
    download_concurrency: usize,
}

impl ModelCacheManager {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        catalog: ModelCatalog,
        state: Arc<CacheState>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            backend,
            catalog: Arc::new(catalog),
            state,
            events,
            download_concurrency: 1,
        }
    }

    /// Fetch the catalog and seed the state with models already on disk.
    ///
    /// A failing catalog fetch is fatal; a failing disk scan only means the
    /// cache starts empty and re-validates models on first use.
    pub async fn initialize(backend: Arc<dyn ModelBackend>) -> Result<Self, CacheError> {
        let catalog = ModelCatalog::fetch(backend.as_ref()).await?;

        let installed = match backend.installed_models().await {
            Ok(installed) => installed,
            Err(e) => {
                warn!("Could not scan installed models, starting empty: {}", e);
                Vec::new()
            }
        };

        info!(
            "Model catalog loaded: {} pairs available, {} installed",
            catalog.len(),
            installed.len()
        );

        let state = Arc::new(CacheState::with_installed(installed));
        Ok(Self::new(backend, catalog, state))
    }

    /// How many pairs batch downloads fetch at once (at least 1).
    pub fn with_download_concurrency(mut self, concurrency: usize) -> Self {
        self.download_concurrency = concurrency.max(1);
        self
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &Arc<CacheState> {
        &self.state
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.events.subscribe()
    }

    /// Every pair in the catalog, installed or not.
    pub fn list_available(&self) -> Vec<LanguagePair> {
        self.catalog.pairs().to_vec()
    }

    /// Current status of `pair`. Catalog pairs never referenced are `Available`.
    pub fn status(&self, pair: &LanguagePair) -> Option<ModelStatus> {
        self.state.status(pair).or_else(|| {
            self.catalog
                .contains(pair)
                .then_some(ModelStatus::Available)
        })
    }

    pub fn records(&self) -> Vec<ModelRecord> {
        self.state.records()
    }

    pub fn installed(&self) -> Vec<ModelRecord> {
        self.state.installed()
    }

    pub fn installed_count(&self) -> usize {
        self.state.installed_count()
    }

    /// Make sure the model for `pair` is installed and return its handle.
    ///
    /// - Unknown pairs fail with [`CacheError::UnsupportedLanguagePair`]
    ///   without touching the backend.
    /// - Installed pairs return immediately.
    /// - If the pair is already downloading, waits for that download and
    ///   returns its outcome.
    /// - Otherwise starts a download. It runs in its own task, so dropping
    ///   this future does not cancel it.
    pub async fn ensure_installed(&self, pair: &LanguagePair) -> Result<ModelHandle, CacheError> {
        if !self.catalog.contains(pair) {
            debug!("Rejecting {}: not in catalog", pair);
            return Err(CacheError::UnsupportedLanguagePair(pair.clone()));
        }

        let mut inflight = match self.state.claim(pair) {
            Claim::Ready(handle) => return Ok(handle),
            Claim::Wait(inflight) => {
                info!("Model {} is already downloading, waiting for it", pair);
                let _ = self.events.send(ModelEvent::Joined { pair: pair.clone() });
                inflight
            }
            Claim::Lead(tx) => {
                let inflight = tx.subscribe();
                self.spawn_download(pair.clone(), tx);
                inflight
            }
        };

        wait_for_outcome(pair, &mut inflight).await
    }

    /// Like [`Self::ensure_installed`], but stop waiting after `timeout`.
    ///
    /// A timeout leaves the cache untouched: the download keeps going and
    /// later callers see its result.
    pub async fn ensure_installed_within(
        &self,
        pair: &LanguagePair,
        timeout: Duration,
    ) -> Result<ModelHandle, CacheError> {
        match tokio::time::timeout(timeout, self.ensure_installed(pair)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Timed out after {:?} waiting for model {}", timeout, pair);
                Err(CacheError::TimedOut {
                    pair: pair.clone(),
                    waited: timeout,
                })
            }
        }
    }

    /// Install every pair in the catalog. Individual failures are collected,
    /// never fatal.
    pub async fn download_all(&self) -> DownloadSummary {
        info!(
            "Downloading all {} available translation packages...",
            self.catalog.len()
        );
        let pairs = self.list_available();
        self.download_pairs(&pairs).await
    }

    /// Install the given pairs, reporting outcomes in request order.
    /// Pairs missing from the catalog count as failures.
    pub async fn download_pairs(&self, pairs: &[LanguagePair]) -> DownloadSummary {
        let outcomes: Vec<(LanguagePair, Outcome)> = futures_util::stream::iter(pairs.iter().cloned())
            .map(|pair| async move {
                info!("Downloading {} → {}...", pair.from_code(), pair.to_code());
                let outcome = self.ensure_installed(&pair).await;
                (pair, outcome)
            })
            .buffered(self.download_concurrency)
            .collect()
            .await;

        let mut summary = DownloadSummary::default();
        for (pair, outcome) in outcomes {
            match outcome {
                Ok(_) => summary.succeeded.push(pair),
                Err(e) => {
                    warn!(
                        "Failed to download {} → {}: {}",
                        pair.from_code(),
                        pair.to_code(),
                        e
                    );
                    summary.failed.push((pair, e));
                }
            }
        }

        info!(
            "Download complete! {} successful, {} failed.",
            summary.success_count(),
            summary.failure_count()
        );
        summary
    }

    fn spawn_download(&self, pair: LanguagePair, tx: OutcomeSender) {
        info!("Starting download of model {}", pair);
        let _ = self.events.send(ModelEvent::Started { pair: pair.clone() });

        let backend = self.backend.clone();
        let guard = InflightGuard {
            pair,
            state: self.state.clone(),
            events: self.events.clone(),
            tx: Some(tx),
        };

        tokio::spawn(async move {
            let pair = guard.pair.clone();
            let outcome = match backend.download_model(&pair).await {
                Ok(path) => Ok(ModelHandle::new(pair, path)),
                Err(e) => Err(CacheError::DownloadFailed {
                    pair,
                    reason: e.to_string(),
                }),
            };
            guard.finish(outcome);
        });
    }
}

async fn wait_for_outcome(pair: &LanguagePair, inflight: &mut OutcomeReceiver) -> Outcome {
    match inflight.wait_for(Option::is_some).await {
        Ok(outcome) => match &*outcome {
            Some(outcome) => outcome.clone(),
            None => Err(aborted(pair)),
        },
        Err(_) => Err(aborted(pair)),
    }
}

fn aborted(pair: &LanguagePair) -> CacheError {
    CacheError::DownloadFailed {
        pair: pair.clone(),
        reason: "download task ended without a result".to_string(),
    }
}

/// Resolves an in-flight download exactly once. If the download task dies
/// before reporting, `Drop` marks the pair failed so waiters wake up and the
/// next request can retry.
struct InflightGuard {
    pair: LanguagePair,
    state: Arc<CacheState>,
    events: broadcast::Sender<ModelEvent>,
    tx: Option<OutcomeSender>,
}

impl InflightGuard {
    fn finish(mut self, outcome: Outcome) {
        self.resolve(outcome);
    }

    fn resolve(&mut self, outcome: Outcome) {
        let Some(tx) = self.tx.take() else {
            return;
        };

        let event = match &outcome {
            Ok(handle) => {
                info!("Model {} installed at {:?}", self.pair, handle.path());
                ModelEvent::Installed {
                    pair: self.pair.clone(),
                    path: handle.path().to_path_buf(),
                }
            }
            Err(e) => {
                error!("Model {} failed: {}", self.pair, e);
                ModelEvent::Failed {
                    pair: self.pair.clone(),
                    error: e.to_string(),
                }
            }
        };

        // State first, so a woken waiter that asks again sees the new status.
        self.state.resolve(&self.pair, &outcome);
        let _ = self.events.send(event);
        tx.send_replace(Some(outcome));
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        if self.tx.is_some() {
            let pair = self.pair.clone();
            self.resolve(Err(aborted(&pair)));
        }
    }
}
