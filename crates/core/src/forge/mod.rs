//! Forge adapters: one capability interface, one implementation per forge.
//!
//! Every adapter exposes the same three operations. GitHub and Gitea share
//! the commit → tree → blob walk in [`rest`]; GitLab is a stub because its
//! API does not expose arbitrary ref namespaces.

pub mod gitea;
pub mod github;
pub mod gitlab;
pub(crate) mod rest;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::ResolveError;
use crate::models::{ForgeConfig, ForgeType, RefEntry, ResolveResult};
use crate::transport::HttpTransport;

pub use gitea::GiteaAdapter;
pub use github::GitHubAdapter;
pub use gitlab::GitLabAdapter;

/// The single identity ref.
pub const IDENTITY_REF: &str = "refs/auths/identity";
/// Prefix shared by every device attestation ref.
pub const DEVICE_REF_PREFIX: &str = "refs/auths/devices/nodes";
/// Blob holding the controller DID, at the root of the identity ref's tree.
pub const IDENTITY_BLOB: &str = "identity.json";
/// Blob holding a device attestation, at the root of each device ref's tree.
pub const ATTESTATION_BLOB: &str = "attestation.json";

/// Resolves auths identity data through one forge's REST API.
#[async_trait]
pub trait ForgeAdapter: Send + Sync {
    /// List the refs under `refs/auths/`, in the order the forge returns them.
    async fn list_auths_refs(&self, config: &ForgeConfig) -> Result<Vec<RefEntry>, ResolveError>;

    /// Read a blob by SHA and return its decoded text.
    async fn read_blob(&self, config: &ForgeConfig, sha: &str) -> Result<String, ResolveError>;

    /// Resolve the identity bundle. Never fails: errors are reported in the
    /// returned [`ResolveResult`].
    async fn resolve(&self, config: &ForgeConfig, identity_filter: Option<&str>) -> ResolveResult;
}

/// Bearer tokens for forges that accept them. Absent tokens mean anonymous
/// requests.
#[derive(Debug, Clone, Default)]
pub struct ForgeCredentials {
    pub github_token: Option<String>,
    pub gitea_token: Option<String>,
}

/// Maps each forge type to its adapter.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<ForgeType, Arc<dyn ForgeAdapter>>,
}

impl AdapterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The GitHub, Gitea and GitLab adapters sharing one transport.
    pub fn standard(transport: Arc<dyn HttpTransport>, credentials: &ForgeCredentials) -> Self {
        let mut registry = Self::new();
        registry.register(
            ForgeType::GitHub,
            Arc::new(
                GitHubAdapter::new(transport.clone()).with_token(credentials.github_token.clone()),
            ),
        );
        registry.register(
            ForgeType::Gitea,
            Arc::new(GiteaAdapter::new(transport).with_token(credentials.gitea_token.clone())),
        );
        registry.register(ForgeType::GitLab, Arc::new(GitLabAdapter::new()));
        registry
    }

    /// Install `adapter` for `forge_type`, replacing any previous one.
    pub fn register(&mut self, forge_type: ForgeType, adapter: Arc<dyn ForgeAdapter>) {
        self.adapters.insert(forge_type, adapter);
    }

    pub fn get(&self, forge_type: ForgeType) -> Option<Arc<dyn ForgeAdapter>> {
        self.adapters.get(&forge_type).cloned()
    }

    pub fn contains(&self, forge_type: ForgeType) -> bool {
        self.adapters.contains_key(&forge_type)
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&str> = self.adapters.keys().map(|t| t.as_str()).collect();
        types.sort_unstable();
        f.debug_struct("AdapterRegistry")
            .field("forges", &types)
            .finish()
    }
}
