//! Provider factory for centralized provider creation.
//!
//! Creating a provider validates its registry entry up front (API key,
//! service URL) so that misconfiguration surfaces when a provider is
//! selected rather than on the first request.

use std::sync::Arc;

use tracing::debug;

use super::ors::OrsProvider;
use super::osrm::OsrmProvider;
use super::registry::ProviderRegistry;
use super::types::{DirectionsProvider, ProviderError, ProviderId};

/// Creates providers bound to a shared registry.
#[derive(Clone, Default)]
pub struct ProviderFactory {
    registry: ProviderRegistry,
}

impl ProviderFactory {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Creates the provider for `id`.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::MissingApiKey`] if the provider needs a key and
    ///   none is registered
    /// - [`ProviderError::InvalidUrl`] if the registered service URL is not
    ///   an http(s) URL
    pub fn create(&self, id: ProviderId) -> Result<Arc<dyn DirectionsProvider>, ProviderError> {
        let settings = self.registry.get(id).unwrap_or_default();

        if id.requires_api_key() && settings.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ProviderError::MissingApiKey(id));
        }
        if let Some(url) = &settings.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ProviderError::InvalidUrl {
                    provider: id,
                    url: url.clone(),
                });
            }
        }

        debug!(provider = %id, "creating directions provider");
        let provider: Arc<dyn DirectionsProvider> = match id {
            ProviderId::Osrm => Arc::new(OsrmProvider::new(self.registry.clone())),
            ProviderId::OpenRouteService => Arc::new(OrsProvider::new(self.registry.clone())),
        };
        Ok(provider)
    }

    /// Creates the registry's current default provider.
    pub fn create_default(&self) -> Result<Arc<dyn DirectionsProvider>, ProviderError> {
        self.create(self.registry.default_provider())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderSettings;

    #[test]
    fn test_create_osrm_without_settings() {
        let factory = ProviderFactory::new(ProviderRegistry::new());
        let provider = factory.create(ProviderId::Osrm).unwrap();
        assert_eq!(provider.id(), ProviderId::Osrm);
        assert_eq!(provider.max_waypoints_per_request(), 25);
    }

    #[test]
    fn test_ors_requires_api_key() {
        let registry = ProviderRegistry::new();
        let factory = ProviderFactory::new(registry.clone());
        assert_eq!(
            factory.create(ProviderId::OpenRouteService).err(),
            Some(ProviderError::MissingApiKey(ProviderId::OpenRouteService))
        );

        registry
            .add(
                ProviderId::OpenRouteService,
                ProviderSettings::default().with_api_key("key"),
            )
            .unwrap();
        let provider = factory.create(ProviderId::OpenRouteService).unwrap();
        assert_eq!(provider.id(), ProviderId::OpenRouteService);
        assert_eq!(provider.max_waypoints_per_request(), 50);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let registry = ProviderRegistry::new();
        registry
            .add(
                ProviderId::Osrm,
                ProviderSettings::default().with_base_url("ftp://example.com"),
            )
            .unwrap();
        let factory = ProviderFactory::new(registry);
        assert!(matches!(
            factory.create(ProviderId::Osrm).err(),
            Some(ProviderError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_create_default_follows_registry() {
        let registry = ProviderRegistry::new();
        registry.update_or_create(ProviderId::OpenRouteService, |s| {
            s.api_key = Some("key".to_string())
        });
        registry.set_default(ProviderId::OpenRouteService).unwrap();

        let factory = ProviderFactory::new(registry);
        assert_eq!(
            factory.create_default().unwrap().id(),
            ProviderId::OpenRouteService
        );
    }
}
