//! Translation model cache for offline language-pair models.
//!
//! This crate keeps track of which language-pair models are installed,
//! installs missing ones on demand through a [`ModelBackend`], and makes
//! sure only one download per pair is ever in flight. Callers that ask for a
//! pair that is already downloading wait for that download instead of
//! starting another one.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use translate_bot_model_cache::{LanguagePair, ModelBackend, ModelCacheManager};
//!
//! async fn warm_up(backend: Arc<dyn ModelBackend>) -> Result<(), translate_bot_model_cache::CacheError> {
//!     let manager = ModelCacheManager::initialize(backend).await?;
//!     let handle = manager.ensure_installed(&LanguagePair::new("en", "es")).await?;
//!     println!("en → es installed at {:?}", handle.path());
//!     Ok(())
//! }
//! ```

mod backend;
mod catalog;
mod error;
pub mod events;
mod manager;
mod pair;
mod state;
mod status;

pub use backend::{BackendError, ModelBackend};
pub use catalog::ModelCatalog;
pub use error::CacheError;
pub use events::ModelEvent;
pub use manager::{DownloadSummary, ModelCacheManager};
pub use pair::{LanguagePair, ParsePairError};
pub use state::CacheState;
pub use status::{ModelHandle, ModelRecord, ModelStatus};
