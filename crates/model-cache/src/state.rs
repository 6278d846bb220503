use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use tokio::sync::watch;

use crate::{CacheError, LanguagePair, ModelHandle, ModelRecord, ModelStatus};

pub(crate) type Outcome = Result<ModelHandle, CacheError>;

/// Completion signal of one in-flight download. `None` until it resolves.
pub(crate) type OutcomeSender = watch::Sender<Option<Outcome>>;
pub(crate) type OutcomeReceiver = watch::Receiver<Option<Outcome>>;

struct Entry {
    record: ModelRecord,
    inflight: Option<OutcomeReceiver>,
}

impl Entry {
    fn new(record: ModelRecord) -> Self {
        Self {
            record,
            inflight: None,
        }
    }
}

/// What a caller of `claim` has to do next.
pub(crate) enum Claim {
    /// Already installed
    Ready(ModelHandle),
    /// Someone else is downloading; wait on their signal
    Wait(OutcomeReceiver),
    /// The caller now owns the download and must resolve it
    Lead(OutcomeSender),
}

/// Per-pair model state shared by every clone of the cache manager.
///
/// The lock only guards the map for the short check-and-set of a status
/// transition. It is never held across an `.await`.
#[derive(Default)]
pub struct CacheState {
    entries: Mutex<HashMap<LanguagePair, Entry>>,
}

impl CacheState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State with some pairs already installed, e.g. found on disk at startup.
    pub fn with_installed(installed: impl IntoIterator<Item = (LanguagePair, PathBuf)>) -> Self {
        let entries = installed
            .into_iter()
            .map(|(pair, location)| {
                let record = ModelRecord::installed(pair.clone(), location);
                (pair, Entry::new(record))
            })
            .collect();

        Self {
            entries: Mutex::new(entries),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<LanguagePair, Entry>> {
        // Every critical section leaves the map consistent, so a poisoned
        // lock is still safe to use.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically look up `pair` and, unless it is installed or already
    /// downloading, mark it as downloading on behalf of the caller.
    pub(crate) fn claim(&self, pair: &LanguagePair) -> Claim {
        let mut entries = self.lock();
        let entry = entries
            .entry(pair.clone())
            .or_insert_with(|| Entry::new(ModelRecord::available(pair.clone())));

        match entry.record.status {
            ModelStatus::Installed => {
                if let Some(handle) = entry.record.handle() {
                    entry.record.last_used = Some(SystemTime::now());
                    return Claim::Ready(handle);
                }
            }
            ModelStatus::Downloading => {
                if let Some(inflight) = &entry.inflight {
                    return Claim::Wait(inflight.clone());
                }
            }
            ModelStatus::Available | ModelStatus::Failed => {}
        }

        let (tx, rx) = watch::channel(None);
        entry.record.status = ModelStatus::Downloading;
        entry.record.last_error = None;
        entry.inflight = Some(rx);
        Claim::Lead(tx)
    }

    /// Record the outcome of the in-flight download for `pair`.
    pub(crate) fn resolve(&self, pair: &LanguagePair, outcome: &Outcome) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(pair) else {
            return;
        };

        entry.inflight = None;
        match outcome {
            Ok(handle) => {
                entry.record.status = ModelStatus::Installed;
                entry.record.location = Some(handle.path().to_path_buf());
                entry.record.last_used = Some(SystemTime::now());
                entry.record.last_error = None;
            }
            Err(e) => {
                entry.record.status = ModelStatus::Failed;
                entry.record.last_error = Some(e.to_string());
            }
        }
    }

    /// Snapshot of one record, `None` if the pair was never referenced.
    pub fn record(&self, pair: &LanguagePair) -> Option<ModelRecord> {
        self.lock().get(pair).map(|e| e.record.clone())
    }

    pub fn status(&self, pair: &LanguagePair) -> Option<ModelStatus> {
        self.lock().get(pair).map(|e| e.record.status)
    }

    /// Snapshot of every record, sorted by pair.
    pub fn records(&self) -> Vec<ModelRecord> {
        let mut records: Vec<ModelRecord> =
            self.lock().values().map(|e| e.record.clone()).collect();
        records.sort_by(|a, b| a.pair.cmp(&b.pair));
        records
    }

    /// Installed records, sorted by pair.
    pub fn installed(&self) -> Vec<ModelRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.status == ModelStatus::Installed)
            .collect()
    }

    pub fn installed_count(&self) -> usize {
        self.lock()
            .values()
            .filter(|e| e.record.status == ModelStatus::Installed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> LanguagePair {
        LanguagePair::new("en", "es")
    }

    #[test]
    fn test_first_claim_leads_and_second_waits() {
        let state = CacheState::new();

        assert!(matches!(state.claim(&pair()), Claim::Lead(_)));
        assert_eq!(state.status(&pair()), Some(ModelStatus::Downloading));
        assert!(matches!(state.claim(&pair()), Claim::Wait(_)));
    }

    #[test]
    fn test_resolve_success_installs() {
        let state = CacheState::new();
        let Claim::Lead(_tx) = state.claim(&pair()) else {
            panic!("expected to lead the download");
        };

        let handle = ModelHandle::new(pair(), PathBuf::from("/models/en_es"));
        state.resolve(&pair(), &Ok(handle.clone()));

        let record = state.record(&pair()).expect("record should exist");
        assert_eq!(record.status, ModelStatus::Installed);
        assert_eq!(record.location, Some(PathBuf::from("/models/en_es")));
        assert!(record.last_used.is_some());

        match state.claim(&pair()) {
            Claim::Ready(h) => assert_eq!(h, handle),
            _ => panic!("installed pair should be ready"),
        }
    }

    #[test]
    fn test_failed_pair_can_be_claimed_again() {
        let state = CacheState::new();
        let Claim::Lead(_tx) = state.claim(&pair()) else {
            panic!("expected to lead the download");
        };

        state.resolve(
            &pair(),
            &Err(CacheError::DownloadFailed {
                pair: pair(),
                reason: "connection reset".to_string(),
            }),
        );

        let record = state.record(&pair()).expect("record should exist");
        assert_eq!(record.status, ModelStatus::Failed);
        assert!(record
            .last_error
            .as_deref()
            .is_some_and(|e| e.contains("connection reset")));

        assert!(matches!(state.claim(&pair()), Claim::Lead(_)));
        assert_eq!(state.record(&pair()).and_then(|r| r.last_error), None);
    }

    #[test]
    fn test_seeded_installed_models() {
        let state = CacheState::with_installed(vec![
            (LanguagePair::new("de", "en"), PathBuf::from("/models/de_en")),
            (pair(), PathBuf::from("/models/en_es")),
        ]);

        assert_eq!(state.installed_count(), 2);
        let installed: Vec<String> = state
            .installed()
            .iter()
            .map(|r| r.pair.to_string())
            .collect();
        assert_eq!(installed, vec!["de-en", "en-es"]);
        assert!(matches!(state.claim(&pair()), Claim::Ready(_)));
    }

    #[test]
    fn test_unreferenced_pair_has_no_record() {
        let state = CacheState::new();
        assert!(state.record(&pair()).is_none());
        assert!(state.records().is_empty());
    }
}
