//! Registry of the providers the extension exposes.

use satchel_core::provider::{ProviderMeta, RpcProvider};
use std::{collections::{BTreeMap, HashMap}, fmt, sync::Arc};

type Starter = Box<dyn Fn() -> Arc<dyn RpcProvider> + Send + Sync>;

/// An exposed provider: static metadata plus a lazy constructor. The
/// provider is not running at registration; calling `start` instantiates
/// it.
pub struct ProviderEntry {
    pub(crate) meta: ProviderMeta,
    pub(crate) start: Starter,
}

/// Fixed mapping of provider keys to exposed providers, supplied at
/// construction and immutable afterwards.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: HashMap<String, ProviderEntry>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider under `key`, builder style.
    pub fn with_provider<F>(mut self, key: impl Into<String>, meta: ProviderMeta, start: F) -> Self
    where
        F: Fn() -> Arc<dyn RpcProvider> + Send + Sync + 'static,
    {
        self.entries.insert(key.into(), ProviderEntry { meta, start: Box::new(start) });
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn get(&self, key: &str) -> Option<&ProviderEntry> {
        self.entries.get(key)
    }

    /// Key to metadata for every exposed provider.
    pub fn list(&self) -> BTreeMap<String, ProviderMeta> {
        self.entries.iter().map(|(key, entry)| (key.clone(), entry.meta.clone())).collect()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
