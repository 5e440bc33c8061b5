//! Resolver orchestrator.
//!
//! Ties the detector, cache and adapter registry together behind
//! [`Resolver::resolve_from_repo`]: detect forge → check cache → pick
//! adapter → resolve → cache the outcome.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::cache::{cache_key, ResolveCache};
use crate::config::ResolverConfig;
use crate::detect::detect_forge;
use crate::errors::ResolveError;
use crate::forge::AdapterRegistry;
use crate::models::ResolveResult;
use crate::transport::{HttpTransport, ReqwestTransport};

/// Resolves identity bundles from repository URLs.
///
/// The cache is shared through an `Arc` so several resolvers (or a resolver
/// and an admin task calling [`ResolveCache::clear`]) can see the same
/// entries.
#[derive(Clone)]
pub struct Resolver {
    adapters: AdapterRegistry,
    cache: Arc<ResolveCache>,
}

impl Resolver {
    pub fn new(adapters: AdapterRegistry, cache: Arc<ResolveCache>) -> Self {
        Self { adapters, cache }
    }

    /// Standard adapters over `transport`, anonymous requests.
    pub fn with_transport(transport: Arc<dyn HttpTransport>, cache: Arc<ResolveCache>) -> Self {
        Self::new(
            AdapterRegistry::standard(transport, &Default::default()),
            cache,
        )
    }

    /// Build a resolver with a `reqwest` transport, credentials and cache TTL
    /// taken from `config`.
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ResolveError> {
        let transport = ReqwestTransport::new(&config.http.user_agent)?;
        let cache = ResolveCache::with_ttl(config.cache.ttl());
        info!(
            ttl_secs = config.cache.ttl_secs,
            github_auth = config.http.github_token.is_some(),
            gitea_auth = config.http.gitea_token.is_some(),
            "initializing resolver"
        );
        Ok(Self::new(
            AdapterRegistry::standard(Arc::new(transport), &config.credentials()),
            Arc::new(cache),
        ))
    }

    pub fn cache(&self) -> &Arc<ResolveCache> {
        &self.cache
    }

    /// Resolve identity and attestation data for `repo_url`.
    ///
    /// Never fails: every error is reported through [`ResolveResult::error`].
    /// Results, including failures, are cached under
    /// `repo_url|identity_filter`.
    #[instrument(skip(self))]
    pub async fn resolve_from_repo(
        &self,
        repo_url: &str,
        forge_hint: Option<&str>,
        identity_filter: Option<&str>,
    ) -> ResolveResult {
        let Some(config) = detect_forge(repo_url, forge_hint) else {
            warn!("could not parse repository URL");
            return ResolveResult::failure(ResolveError::UrlParse(repo_url.to_string()).to_string());
        };

        let key = cache_key(repo_url, identity_filter);
        if let Some(cached) = self.cache.get(&key) {
            debug!(key, success = cached.is_success(), "returning cached result");
            return cached;
        }

        let Some(adapter) = self.adapters.get(config.forge_type) else {
            warn!(forge = %config.forge_type, "no adapter registered");
            return ResolveResult::failure(
                ResolveError::UnknownForge(config.forge_type).to_string(),
            );
        };

        debug!(forge = %config.forge_type, base_url = %config.base_url, "resolving");
        let result = adapter.resolve(&config, identity_filter).await;
        self.cache.set(&key, result.clone());

        match &result.error {
            None => info!(forge = %config.forge_type, "resolve succeeded"),
            Some(error) => info!(forge = %config.forge_type, error = %error, "resolve failed"),
        }
        result
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("adapters", &self.adapters)
            .field("cached_entries", &self.cache.len())
            .finish()
    }
}
