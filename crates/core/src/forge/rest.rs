//! Shared plumbing for forges that expose Git's object model over REST.
//!
//! GitHub and Gitea serve the same commit/tree/blob shapes under different
//! path roots, so the identity walk lives here once and each adapter only
//! supplies its root URL and ref-listing dialect.

use std::sync::Arc;

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{ForgeAdapter, ATTESTATION_BLOB, DEVICE_REF_PREFIX, IDENTITY_BLOB, IDENTITY_REF};
use crate::did::{did_key_to_public_key_hex, DID_KEY_PREFIX};
use crate::errors::ResolveError;
use crate::models::{ForgeConfig, IdentityBundle, RefEntry};
use crate::transport::{HttpResponse, HttpTransport};

// ---------------------------------------------------------------------------
// Upstream response schemas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ShaObject {
    pub sha: String,
}

/// One element of a ref listing: `{ref, object: {sha}}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RefObject {
    #[serde(rename = "ref")]
    pub ref_path: String,
    pub object: ShaObject,
}

impl From<RefObject> for RefEntry {
    fn from(obj: RefObject) -> Self {
        RefEntry::new(obj.ref_path, obj.object.sha)
    }
}

/// A ref listing that may be an array or, for a single match, a bare object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RefListing {
    Many(Vec<RefObject>),
    One(RefObject),
}

impl RefListing {
    pub fn into_entries(self) -> Vec<RefEntry> {
        match self {
            Self::Many(objs) => objs.into_iter().map(RefEntry::from).collect(),
            Self::One(obj) => vec![obj.into()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommitObject {
    pub tree: ShaObject,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TreeEntry {
    pub path: String,
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TreeObject {
    pub tree: Vec<TreeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BlobObject {
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

/// `identity.json`; the controller DID lives under one of two field names.
#[derive(Debug, Default, Deserialize)]
struct IdentityDocument {
    #[serde(default)]
    controller_did: Option<String>,
    #[serde(default)]
    identity_did: Option<String>,
}

impl IdentityDocument {
    fn controller_did(self) -> Option<String> {
        self.controller_did
            .or(self.identity_did)
            .filter(|did| !did.is_empty())
    }
}

// ---------------------------------------------------------------------------
// REST client
// ---------------------------------------------------------------------------

/// GET-and-decode helper bound to one forge's headers and error labels.
#[derive(Clone)]
pub(crate) struct RestClient {
    transport: Arc<dyn HttpTransport>,
    forge: &'static str,
    accept: &'static str,
    authorization: Option<String>,
}

impl RestClient {
    pub fn new(transport: Arc<dyn HttpTransport>, forge: &'static str, accept: &'static str) -> Self {
        Self {
            transport,
            forge,
            accept,
            authorization: None,
        }
    }

    /// Send `authorization` verbatim as the `Authorization` header.
    pub fn with_authorization(mut self, authorization: Option<String>) -> Self {
        self.authorization = authorization;
        self
    }

    pub fn forge(&self) -> &'static str {
        self.forge
    }

    /// GET `url`, failing on any non-2xx status.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, ResolveError> {
        let mut headers = vec![("Accept", self.accept)];
        if let Some(auth) = self.authorization.as_deref() {
            headers.push(("Authorization", auth));
        }
        let resp = self.transport.get(url, &headers).await?;
        if !resp.is_success() {
            return Err(ResolveError::Http {
                forge: self.forge,
                status: resp.status,
                reason: resp.reason.clone(),
                url: url.to_string(),
            });
        }
        Ok(resp)
    }

    /// GET `url` and deserialize the body, labelling shape errors with `what`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        what: &'static str,
    ) -> Result<T, ResolveError> {
        let resp = self.get(url).await?;
        resp.json().map_err(|e| ResolveError::UnexpectedResponse {
            forge: self.forge,
            what,
            url: url.to_string(),
            detail: e.to_string(),
        })
    }

    /// `{root}/commits/{sha}` → tree SHA.
    pub async fn commit_tree_sha(&self, root: &str, commit_sha: &str) -> Result<String, ResolveError> {
        let url = format!("{}/commits/{}", root, commit_sha);
        let commit: CommitObject = self.get_json(&url, "commit").await?;
        Ok(commit.tree.sha)
    }

    /// `{root}/trees/{sha}` → entries.
    pub async fn tree_entries(&self, root: &str, tree_sha: &str) -> Result<Vec<TreeEntry>, ResolveError> {
        let url = format!("{}/trees/{}", root, tree_sha);
        let tree: TreeObject = self.get_json(&url, "tree").await?;
        Ok(tree.tree)
    }

    /// `{root}/blobs/{sha}` → decoded text.
    pub async fn blob_text(&self, root: &str, blob_sha: &str) -> Result<String, ResolveError> {
        let url = format!("{}/blobs/{}", root, blob_sha);
        let blob: BlobObject = self.get_json(&url, "blob").await?;
        decode_blob_content(blob).map_err(|detail| ResolveError::UnexpectedResponse {
            forge: self.forge,
            what: "blob",
            url,
            detail,
        })
    }
}

/// Decode base64 blob content; any other encoding is returned verbatim.
pub(crate) fn decode_blob_content(blob: BlobObject) -> Result<String, String> {
    if blob.encoding != "base64" {
        return Ok(blob.content);
    }
    let compact: String = blob
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| format!("invalid base64 content: {}", e))?;
    String::from_utf8(bytes).map_err(|e| format!("blob is not valid UTF-8: {}", e))
}

// ---------------------------------------------------------------------------
// Identity walk
// ---------------------------------------------------------------------------

/// An adapter whose forge serves Git objects under a REST root.
pub(crate) trait GitObjectSource: ForgeAdapter {
    fn rest(&self) -> &RestClient;

    /// URL prefix under which `commits/`, `trees/` and `blobs/` live.
    fn git_root(&self, config: &ForgeConfig) -> String;
}

/// Follow commit → tree → named blob. `Ok(None)` when the tree has no entry
/// called `blob_name`.
pub(crate) async fn read_tree_blob<S>(
    source: &S,
    config: &ForgeConfig,
    commit_sha: &str,
    blob_name: &str,
) -> Result<Option<String>, ResolveError>
where
    S: GitObjectSource + ?Sized,
{
    let root = source.git_root(config);
    let tree_sha = source.rest().commit_tree_sha(&root, commit_sha).await?;
    let entries = source.rest().tree_entries(&root, &tree_sha).await?;

    let Some(entry) = entries.into_iter().find(|e| e.path == blob_name) else {
        debug!(commit_sha, tree_sha, blob_name, "blob not present in tree");
        return Ok(None);
    };
    source.read_blob(config, &entry.sha).await.map(Some)
}

/// Resolve the identity bundle for `config` through `source`.
pub(crate) async fn resolve_identity<S>(
    source: &S,
    config: &ForgeConfig,
    identity_filter: Option<&str>,
) -> Result<IdentityBundle, ResolveError>
where
    S: GitObjectSource + ?Sized,
{
    let refs = source.list_auths_refs(config).await?;
    if refs.is_empty() {
        return Err(ResolveError::NoRefs);
    }

    let identity_ref = refs
        .iter()
        .find(|r| r.ref_path == IDENTITY_REF)
        .ok_or(ResolveError::MissingIdentityRef(IDENTITY_REF))?;

    let identity_text = read_tree_blob(source, config, &identity_ref.sha, IDENTITY_BLOB)
        .await?
        .ok_or_else(|| ResolveError::BlobRead {
            blob: IDENTITY_BLOB,
            origin: "identity ref".into(),
        })?;

    let document: IdentityDocument = serde_json::from_str(&identity_text)
        .map_err(|e| ResolveError::IdentityParse(e.to_string()))?;
    let controller_did = document
        .controller_did()
        .ok_or(ResolveError::MissingControllerDid)?;

    if let Some(filter) = identity_filter.filter(|f| !f.is_empty()) {
        if controller_did != filter {
            return Err(ResolveError::IdentityFilterMismatch {
                did: controller_did,
                filter: filter.to_string(),
            });
        }
    }

    if !controller_did.starts_with(DID_KEY_PREFIX) {
        return Err(ResolveError::UnsupportedDidScheme(controller_did));
    }
    let public_key_hex = did_key_to_public_key_hex(&controller_did)?;

    let attestation_chain = collect_attestations(source, config, &refs).await;

    info!(
        forge = source.rest().forge(),
        owner = %config.owner,
        repo = %config.repo,
        did = %controller_did,
        attestations = attestation_chain.len(),
        "resolved identity bundle"
    );

    Ok(IdentityBundle {
        identity_did: controller_did,
        public_key_hex,
        attestation_chain,
    })
}

/// Fetch `attestation.json` for every device ref, one at a time. Devices
/// that fail to load or parse are skipped.
async fn collect_attestations<S>(
    source: &S,
    config: &ForgeConfig,
    refs: &[RefEntry],
) -> Vec<serde_json::Value>
where
    S: GitObjectSource + ?Sized,
{
    let device_prefix = format!("{}/", DEVICE_REF_PREFIX);
    let mut chain = Vec::new();

    for device_ref in refs.iter().filter(|r| r.ref_path.starts_with(&device_prefix)) {
        let text = match read_tree_blob(source, config, &device_ref.sha, ATTESTATION_BLOB).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!(device_ref = %device_ref.ref_path, "device ref has no attestation.json");
                continue;
            }
            Err(e) => {
                warn!(device_ref = %device_ref.ref_path, error = %e, "skipping unreadable device ref");
                continue;
            }
        };
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(attestation) => chain.push(attestation),
            Err(e) => {
                warn!(device_ref = %device_ref.ref_path, error = %e, "skipping malformed attestation");
            }
        }
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_listing_accepts_array_and_single_object() {
        let many: RefListing = serde_json::from_str(
            r#"[{"ref":"refs/auths/identity","object":{"sha":"a"}},
                {"ref":"refs/auths/devices/nodes/d1/signatures","object":{"sha":"b"}}]"#,
        )
        .unwrap();
        assert_eq!(many.into_entries().len(), 2);

        let one: RefListing =
            serde_json::from_str(r#"{"ref":"refs/auths/identity","object":{"sha":"abc123"}}"#)
                .unwrap();
        assert_eq!(
            one.into_entries(),
            vec![RefEntry::new("refs/auths/identity", "abc123")]
        );

        let empty: RefListing = serde_json::from_str("[]").unwrap();
        assert!(empty.into_entries().is_empty());
    }

    #[test]
    fn test_ref_listing_rejects_wrong_shape() {
        assert!(serde_json::from_str::<RefListing>(r#"{"message":"Not Found"}"#).is_err());
    }

    #[test]
    fn test_decode_base64_blob_with_line_breaks() {
        let blob = BlobObject {
            content: "eyJjb250cm9sbGVyX2RpZCI6\nImRpZDprZXk6ejEifQ==\n".into(),
            encoding: "base64".into(),
        };
        assert_eq!(
            decode_blob_content(blob).unwrap(),
            r#"{"controller_did":"did:key:z1"}"#
        );
    }

    #[test]
    fn test_decode_non_base64_blob_is_verbatim() {
        let blob = BlobObject {
            content: "plain text".into(),
            encoding: "utf-8".into(),
        };
        assert_eq!(decode_blob_content(blob).unwrap(), "plain text");
    }

    #[test]
    fn test_decode_invalid_base64() {
        let blob = BlobObject {
            content: "!!!".into(),
            encoding: "base64".into(),
        };
        assert!(decode_blob_content(blob).is_err());
    }

    #[test]
    fn test_identity_document_field_precedence() {
        let doc: IdentityDocument =
            serde_json::from_str(r#"{"controller_did":"did:a","identity_did":"did:b"}"#).unwrap();
        assert_eq!(doc.controller_did().as_deref(), Some("did:a"));

        let doc: IdentityDocument = serde_json::from_str(r#"{"identity_did":"did:b"}"#).unwrap();
        assert_eq!(doc.controller_did().as_deref(), Some("did:b"));

        let doc: IdentityDocument = serde_json::from_str(r#"{"controller_did":null}"#).unwrap();
        assert_eq!(doc.controller_did(), None);

        let doc: IdentityDocument = serde_json::from_str(r#"{"controller_did":""}"#).unwrap();
        assert_eq!(doc.controller_did(), None);
    }
}
