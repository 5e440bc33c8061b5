//! Gitea adapter for self-hosted instances.
//!
//! Same object model as GitHub under `/api/v1`. The ref listing endpoint
//! returns a bare object instead of an array when exactly one ref matches.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::rest::{self, GitObjectSource, RefListing, RestClient};
use super::ForgeAdapter;
use crate::errors::ResolveError;
use crate::models::{ForgeConfig, RefEntry, ResolveResult};
use crate::transport::HttpTransport;

const ACCEPT_JSON: &str = "application/json";

/// Asynchronous Gitea REST adapter.
#[derive(Clone)]
pub struct GiteaAdapter {
    rest: RestClient,
}

impl GiteaAdapter {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            rest: RestClient::new(transport, "Gitea", ACCEPT_JSON),
        }
    }

    /// Authenticate requests with an access token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.rest = self
            .rest
            .with_authorization(token.map(|t| format!("token {}", t)));
        self
    }
}

impl GitObjectSource for GiteaAdapter {
    fn rest(&self) -> &RestClient {
        &self.rest
    }

    fn git_root(&self, config: &ForgeConfig) -> String {
        format!(
            "{}/api/v1/repos/{}/{}/git",
            config.base_url, config.owner, config.repo
        )
    }
}

#[async_trait]
impl ForgeAdapter for GiteaAdapter {
    #[instrument(skip(self), fields(owner = %config.owner, repo = %config.repo))]
    async fn list_auths_refs(&self, config: &ForgeConfig) -> Result<Vec<RefEntry>, ResolveError> {
        let url = format!("{}/refs/auths", self.git_root(config));
        let listing: RefListing = self.rest.get_json(&url, "ref listing").await?;
        let refs = listing.into_entries();
        debug!(count = refs.len(), "listed auths refs");
        Ok(refs)
    }

    #[instrument(skip(self, config))]
    async fn read_blob(&self, config: &ForgeConfig, sha: &str) -> Result<String, ResolveError> {
        self.rest.blob_text(&self.git_root(config), sha).await
    }

    #[instrument(skip(self), fields(owner = %config.owner, repo = %config.repo))]
    async fn resolve(&self, config: &ForgeConfig, identity_filter: Option<&str>) -> ResolveResult {
        let result = rest::resolve_identity(self, config, identity_filter).await;
        if let Err(ref e) = result {
            warn!(error = %e, "Gitea resolve failed");
        }
        result.into()
    }
}
