//! Domain model types shared by the detector, adapters and resolver.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Forge
// ---------------------------------------------------------------------------

/// A supported Git hosting platform dialect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ForgeType {
    GitHub,
    Gitea,
    GitLab,
}

impl ForgeType {
    /// All forge types with a registered adapter.
    pub const ALL: [ForgeType; 3] = [Self::GitHub, Self::Gitea, Self::GitLab];

    /// Parse a forge hint. Matching is exact: `"github"`, `"gitea"`, `"gitlab"`.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint {
            "github" => Some(Self::GitHub),
            "gitea" => Some(Self::Gitea),
            "gitlab" => Some(Self::GitLab),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::Gitea => "gitea",
            Self::GitLab => "gitlab",
        }
    }
}

impl std::fmt::Display for ForgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ForgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hint(s).ok_or_else(|| format!("unknown forge type: {}", s))
    }
}

/// Where and how to talk to a forge about one repository.
///
/// Derived once per resolve call by [`detect_forge`](crate::detect::detect_forge).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForgeConfig {
    #[serde(rename = "type")]
    pub forge_type: ForgeType,
    /// API base URL without a trailing slash.
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    pub owner: String,
    pub repo: String,
}

/// A single ref returned by a forge ref listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefEntry {
    #[serde(rename = "ref")]
    pub ref_path: String,
    pub sha: String,
}

impl RefEntry {
    pub fn new(ref_path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            ref_path: ref_path.into(),
            sha: sha.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolve output
// ---------------------------------------------------------------------------

/// The resolved identity: controller DID, derived key and device attestations.
///
/// `public_key_hex` is always 64 lowercase hex characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityBundle {
    pub identity_did: String,
    pub public_key_hex: String,
    /// Attestation documents, passed through untouched to the verifier.
    pub attestation_chain: Vec<serde_json::Value>,
}

/// Outcome of a resolve attempt. A present bundle means success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolveResult {
    pub bundle: Option<IdentityBundle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolveResult {
    pub fn success(bundle: IdentityBundle) -> Self {
        Self {
            bundle: Some(bundle),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            bundle: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.bundle.is_some()
    }
}

impl From<Result<IdentityBundle, crate::errors::ResolveError>> for ResolveResult {
    fn from(result: Result<IdentityBundle, crate::errors::ResolveError>) -> Self {
        match result {
            Ok(bundle) => Self::success(bundle),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}
