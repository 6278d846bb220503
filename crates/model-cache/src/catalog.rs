use std::collections::{BTreeSet, HashSet};

use crate::{BackendError, CacheError, LanguagePair, ModelBackend};

/// Every pair the backend can supply. Loaded once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    pairs: Vec<LanguagePair>,
    index: HashSet<LanguagePair>,
}

impl ModelCatalog {
    /// Build a catalog, keeping the first occurrence of duplicate pairs.
    pub fn new(pairs: impl IntoIterator<Item = LanguagePair>) -> Self {
        let mut catalog = Self::default();
        for pair in pairs {
            if catalog.index.insert(pair.clone()) {
                catalog.pairs.push(pair);
            }
        }
        catalog
    }

    /// Fetch the catalog from the backend's index.
    pub async fn fetch(backend: &dyn ModelBackend) -> Result<Self, CacheError> {
        backend
            .fetch_catalog()
            .await
            .map(Self::new)
            .map_err(|e: BackendError| CacheError::Catalog(e.to_string()))
    }

    pub fn contains(&self, pair: &LanguagePair) -> bool {
        self.index.contains(pair)
    }

    /// Pairs in index order
    pub fn pairs(&self) -> &[LanguagePair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Sorted, distinct language codes appearing on either side of a pair.
    pub fn languages(&self) -> Vec<String> {
        self.pairs
            .iter()
            .flat_map(|p| [p.from_code(), p.to_code()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
