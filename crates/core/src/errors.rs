//! Error types for the auths-resolve core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type. Display strings double as the human-readable messages carried
//! in [`ResolveResult::error`](crate::models::ResolveResult).

use thiserror::Error;

use crate::models::ForgeType;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Did(#[from] DidError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// DID codec errors
// ---------------------------------------------------------------------------

/// Errors from decoding or encoding `did:key` identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DidError {
    /// The identifier does not start with `did:key:z`.
    #[error("Expected did:key:z... format, got: {0}")]
    UnsupportedPrefix(String),

    /// A character outside the base58btc alphabet.
    #[error("Invalid base58 character: {0}")]
    InvalidBase58Char(char),

    /// The decoded payload is too short or is not tagged as an Ed25519 key.
    #[error("Expected Ed25519 multicodec prefix (0xED 0x01), got: 0x{found}")]
    InvalidMulticodec { found: String },

    /// A raw public key of the wrong size was supplied for encoding.
    #[error("Expected a 32-byte Ed25519 public key, got {0} bytes")]
    InvalidKeyLength(usize),

    /// A raw public key was not valid hex.
    #[error("public key is not valid hex: {0}")]
    InvalidHex(String),
}

// ---------------------------------------------------------------------------
// Resolve errors
// ---------------------------------------------------------------------------

/// Errors raised while resolving an identity bundle from a forge.
///
/// None of these cross the public resolve boundary as `Err`; they are folded
/// into a [`ResolveResult`](crate::models::ResolveResult) message.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The repository URL is malformed or lacks an owner/repo path.
    #[error("Could not parse repository URL: {0}")]
    UrlParse(String),

    /// The forge reported no refs under `refs/auths/`.
    #[error("No auths refs found in this repository")]
    NoRefs,

    /// Refs exist but none of them is the identity ref.
    #[error("No identity ref found ({0})")]
    MissingIdentityRef(&'static str),

    /// The commit -> tree -> blob walk could not locate the named blob.
    #[error("Could not read {blob} from {origin}")]
    BlobRead {
        blob: &'static str,
        origin: String,
    },

    /// `identity.json` is not a JSON object of the expected shape.
    #[error("Malformed identity.json: {0}")]
    IdentityParse(String),

    /// `identity.json` carries neither `controller_did` nor `identity_did`.
    #[error("No controller_did found in identity.json")]
    MissingControllerDid,

    /// The resolved controller DID differs from the caller's filter.
    #[error("Identity {did} does not match filter {filter}")]
    IdentityFilterMismatch { did: String, filter: String },

    /// The controller DID uses a method other than `did:key:z`.
    #[error("Cannot extract public key from {0}. Only did:key is supported for auto-resolve.")]
    UnsupportedDidScheme(String),

    /// The `did:key` payload failed to decode.
    #[error(transparent)]
    DidDecode(#[from] DidError),

    /// The forge API answered with a non-2xx status.
    #[error("{forge} API {status}: {reason} ({url})")]
    Http {
        forge: &'static str,
        status: u16,
        reason: String,
        url: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset).
    #[error("request to {url} failed: {detail}")]
    Transport { url: String, detail: String },

    /// The forge answered 2xx but the body did not match the expected schema.
    #[error("{forge} API returned an unexpected {what} payload ({url}): {detail}")]
    UnexpectedResponse {
        forge: &'static str,
        what: &'static str,
        url: String,
        detail: String,
    },

    /// No adapter is registered for the detected forge type.
    #[error("No adapter for forge type: {0}")]
    UnknownForge(ForgeType),

    /// The adapter cannot perform this operation on its forge.
    #[error("{0}")]
    Unsupported(String),
}

impl ResolveError {
    /// HTTP status code, when the failure came from an upstream response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
