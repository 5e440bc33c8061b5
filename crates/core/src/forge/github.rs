//! GitHub adapter.
//!
//! Ref listing uses the `matching-refs` endpoint, which always answers with
//! an array. Object reads go through `{api}/repos/{owner}/{repo}/git/...`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::rest::{self, GitObjectSource, RefObject, RestClient};
use super::ForgeAdapter;
use crate::errors::ResolveError;
use crate::models::{ForgeConfig, RefEntry, ResolveResult};
use crate::transport::HttpTransport;

const ACCEPT_GITHUB_JSON: &str = "application/vnd.github.v3+json";

/// Asynchronous GitHub REST adapter.
#[derive(Clone)]
pub struct GitHubAdapter {
    rest: RestClient,
}

impl GitHubAdapter {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            rest: RestClient::new(transport, "GitHub", ACCEPT_GITHUB_JSON),
        }
    }

    /// Authenticate requests with a personal access token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.rest = self
            .rest
            .with_authorization(token.map(|t| format!("Bearer {}", t)));
        self
    }
}

impl GitObjectSource for GitHubAdapter {
    fn rest(&self) -> &RestClient {
        &self.rest
    }

    fn git_root(&self, config: &ForgeConfig) -> String {
        format!(
            "{}/repos/{}/{}/git",
            config.base_url, config.owner, config.repo
        )
    }
}

#[async_trait]
impl ForgeAdapter for GitHubAdapter {
    #[instrument(skip(self), fields(owner = %config.owner, repo = %config.repo))]
    async fn list_auths_refs(&self, config: &ForgeConfig) -> Result<Vec<RefEntry>, ResolveError> {
        let url = format!("{}/matching-refs/auths/", self.git_root(config));
        let objects: Vec<RefObject> = self.rest.get_json(&url, "ref listing").await?;
        let refs: Vec<RefEntry> = objects.into_iter().map(RefEntry::from).collect();
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
            warn!(error = %e, "GitHub resolve failed");
        }
        result.into()
    }
}
