//! GitLab stub.
//!
//! GitLab's refs API only returns branches and tags, never arbitrary refs
//! such as `refs/auths/*`, so nothing here touches the network.

use async_trait::async_trait;
use tracing::debug;

use super::ForgeAdapter;
use crate::errors::ResolveError;
use crate::models::{ForgeConfig, RefEntry, ResolveResult};

/// Message returned by every [`GitLabAdapter::resolve`] call.
pub const GITLAB_UNSUPPORTED_MESSAGE: &str = "GitLab does not expose custom Git refs via its REST API. \
     Provide attestation data manually using the attestation and public-key attributes.";

#[derive(Debug, Clone, Copy, Default)]
pub struct GitLabAdapter;

impl GitLabAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ForgeAdapter for GitLabAdapter {
    async fn list_auths_refs(&self, _config: &ForgeConfig) -> Result<Vec<RefEntry>, ResolveError> {
        Ok(Vec::new())
    }

    async fn read_blob(&self, _config: &ForgeConfig, _sha: &str) -> Result<String, ResolveError> {
        Err(ResolveError::Unsupported(
            "GitLab adapter does not support blob reads".into(),
        ))
    }

    async fn resolve(&self, config: &ForgeConfig, _identity_filter: Option<&str>) -> ResolveResult {
        debug!(owner = %config.owner, repo = %config.repo, "GitLab resolve is not supported");
        ResolveResult::failure(GITLAB_UNSUPPORTED_MESSAGE)
    }
}
