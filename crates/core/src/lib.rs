//! auths-resolve core library.
//!
//! Resolves an auths identity bundle from a repository URL: detects which
//! forge hosts the repository, walks the forge's Git object API from
//! `refs/auths/*` down to `identity.json` and `attestation.json` blobs,
//! decodes the controller's `did:key` into a raw Ed25519 public key and
//! memoizes the outcome for a few minutes.

pub mod cache;
pub mod config;
pub mod detect;
pub mod did;
pub mod errors;
pub mod forge;
pub mod models;
pub mod resolver;
pub mod transport;

// Re-exports for convenience.
pub use cache::ResolveCache;
pub use config::ResolverConfig;
pub use detect::detect_forge;
pub use did::{did_key_to_public_key_hex, sanitize_did_for_ref};
pub use forge::{AdapterRegistry, ForgeAdapter};
pub use models::{ForgeConfig, ForgeType, IdentityBundle, RefEntry, ResolveResult};
pub use resolver::Resolver;
