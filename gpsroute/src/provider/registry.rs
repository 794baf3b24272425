//! Shared per-provider settings and the default provider selection.
//!
//! The registry is a cheap-to-clone handle; clones see the same entries.
//! It starts empty with [`ProviderId::Osrm`] as the default.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use super::types::ProviderId;

/// Errors from registry lookups and mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("provider '{0}' is not registered")]
    NotFound(ProviderId),

    #[error("provider '{0}' is already registered")]
    AlreadyExists(ProviderId),
}

/// Mutable per-provider configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    /// Preferred language for instructions, e.g. `"en"`.
    pub language: Option<String>,
    /// Sent as the HTTP referrer.
    pub referrer: Option<String>,
    /// Overrides the provider's service URL.
    pub base_url: Option<String>,
}

impl ProviderSettings {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

#[derive(Clone)]
pub struct ProviderRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    providers: DashMap<ProviderId, ProviderSettings>,
    default: RwLock<ProviderId>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                providers: DashMap::new(),
                default: RwLock::new(ProviderId::Osrm),
            }),
        }
    }

    /// Returns a copy of the settings for `id`.
    pub fn get(&self, id: ProviderId) -> Result<ProviderSettings, RegistryError> {
        self.inner
            .providers
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(RegistryError::NotFound(id))
    }

    /// Returns the settings for `id`, registering empty ones if missing.
    pub fn get_or_create(&self, id: ProviderId) -> ProviderSettings {
        self.inner.providers.entry(id).or_default().value().clone()
    }

    pub fn add(&self, id: ProviderId, settings: ProviderSettings) -> Result<(), RegistryError> {
        use dashmap::mapref::entry::Entry;

        match self.inner.providers.entry(id) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                debug!(provider = %id, "provider registered");
                slot.insert(settings);
                Ok(())
            }
        }
    }

    /// Applies `f` to the settings of a registered provider.
    pub fn update<F>(&self, id: ProviderId, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut ProviderSettings),
    {
        let mut entry = self
            .inner
            .providers
            .get_mut(&id)
            .ok_or(RegistryError::NotFound(id))?;
        f(entry.value_mut());
        Ok(())
    }

    /// Applies `f` to the settings of `id`, registering it first if needed.
    pub fn update_or_create<F>(&self, id: ProviderId, f: F)
    where
        F: FnOnce(&mut ProviderSettings),
    {
        let mut entry = self.inner.providers.entry(id).or_default();
        f(entry.value_mut());
    }

    pub fn remove(&self, id: ProviderId) -> Option<ProviderSettings> {
        self.inner.providers.remove(&id).map(|(_, settings)| settings)
    }

    pub fn exists(&self, id: ProviderId) -> bool {
        self.inner.providers.contains_key(&id)
    }

    pub fn default_provider(&self) -> ProviderId {
        *self.inner.default.read()
    }

    /// Makes a registered provider the default, returning the previous one.
    pub fn set_default(&self, id: ProviderId) -> Result<ProviderId, RegistryError> {
        if !self.exists(id) {
            return Err(RegistryError::NotFound(id));
        }
        Ok(self.replace_default(id))
    }

    /// Makes `id` the default, registering it if needed. Returns the previous default.
    pub fn set_default_or_create(&self, id: ProviderId) -> ProviderId {
        self.get_or_create(id);
        self.replace_default(id)
    }

    fn replace_default(&self, id: ProviderId) -> ProviderId {
        let previous = std::mem::replace(&mut *self.inner.default.write(), id);
        if previous != id {
            debug!(from = %previous, to = %id, "default provider changed");
        }
        previous
    }
}
