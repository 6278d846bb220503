use std::time::Duration;

use crate::LanguagePair;

/// Errors returned by the cache manager.
///
/// `Clone` because every caller waiting on the same download receives the
/// same outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The pair is not in the catalog. Retrying will not help.
    #[error("translation from {} to {} is not available", .0.from_code(), .0.to_code())]
    UnsupportedLanguagePair(LanguagePair),

    /// Network or storage failure while installing. Safe to retry.
    #[error("download of {pair} failed: {reason}")]
    DownloadFailed { pair: LanguagePair, reason: String },

    /// The caller stopped waiting; the download itself keeps running.
    #[error("gave up waiting for {pair} after {waited:?}")]
    TimedOut { pair: LanguagePair, waited: Duration },

    #[error("failed to load model catalog: {0}")]
    Catalog(String),
}

impl CacheError {
    /// Whether asking again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CacheError::DownloadFailed { .. } | CacheError::TimedOut { .. }
        )
    }
}
