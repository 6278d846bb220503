use std::path::PathBuf;

use async_trait::async_trait;

use crate::LanguagePair;

/// Failures reported by a [`ModelBackend`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Package index error: {0}")]
    Index(String),
    #[error("Verification failed: {0}")]
    Verification(String),
}

/// Source of translation models.
///
/// Implementations know where the package index lives, how to download one
/// package and where installed packages end up on disk. The cache manager
/// decides *when* those calls happen.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Fetch every pair the backend can supply.
    async fn fetch_catalog(&self) -> Result<Vec<LanguagePair>, BackendError>;

    /// Download and install the model for `pair`, returning its local path.
    async fn download_model(&self, pair: &LanguagePair) -> Result<PathBuf, BackendError>;

    /// Models already present on disk, used to seed the cache at startup.
    async fn installed_models(&self) -> Result<Vec<(LanguagePair, PathBuf)>, BackendError> {
        Ok(Vec::new())
    }
}
