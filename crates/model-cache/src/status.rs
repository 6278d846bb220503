use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::LanguagePair;

/// Installation status of a language-pair model.
///
/// Transitions: `Available → Downloading → Installed | Failed`, and
/// `Failed → Downloading` when a caller retries. `Installed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ModelStatus {
    /// Known to the catalog, not fetched yet
    Available,
    /// A download is in flight
    Downloading,
    /// Present on disk and ready to use
    Installed,
    /// Last download attempt failed; the next request retries
    Failed,
}

/// Everything the cache knows about one pair.
#[derive(Debug, Clone)]
pub struct ModelRecord {
    pub pair: LanguagePair,
    pub status: ModelStatus,
    /// Local storage location, set once installed
    pub location: Option<PathBuf>,
    pub last_used: Option<SystemTime>,
    /// Error message of the last failed attempt
    pub last_error: Option<String>,
}

impl ModelRecord {
    pub(crate) fn available(pair: LanguagePair) -> Self {
        Self {
            pair,
            status: ModelStatus::Available,
            location: None,
            last_used: None,
            last_error: None,
        }
    }

    pub(crate) fn installed(pair: LanguagePair, location: PathBuf) -> Self {
        Self {
            pair,
            status: ModelStatus::Installed,
            location: Some(location),
            last_used: None,
            last_error: None,
        }
    }

    /// Handle to the installed model, `None` unless the record is installed.
    pub fn handle(&self) -> Option<ModelHandle> {
        match (self.status, &self.location) {
            (ModelStatus::Installed, Some(location)) => {
                Some(ModelHandle::new(self.pair.clone(), location.clone()))
            }
            _ => None,
        }
    }
}

/// A usable, installed model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    pair: LanguagePair,
    path: PathBuf,
}

impl ModelHandle {
    pub fn new(pair: LanguagePair, path: PathBuf) -> Self {
        Self { pair, path }
    }

    pub fn pair(&self) -> &LanguagePair {
        &self.pair
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
