//! Download lifecycle events.
//!
//! Emitted on a broadcast channel by the cache manager. Subscribers that lag
//! behind simply miss events; nothing in the manager depends on them being
//! read.

use std::path::PathBuf;

use crate::LanguagePair;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// A download was started for this pair
    Started { pair: LanguagePair },
    /// A caller found the pair already downloading and is waiting on it
    Joined { pair: LanguagePair },
    /// Download finished and the model is usable
    Installed { pair: LanguagePair, path: PathBuf },
    /// Download failed; the next request for the pair retries
    Failed { pair: LanguagePair, error: String },
}

impl ModelEvent {
    pub fn pair(&self) -> &LanguagePair {
        match self {
            ModelEvent::Started { pair }
            | ModelEvent::Joined { pair }
            | ModelEvent::Installed { pair, .. }
            | ModelEvent::Failed { pair, .. } => pair,
        }
    }
}
