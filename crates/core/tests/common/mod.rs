//! Shared fixtures for forge adapter tests: a canned-response transport and
//! helpers for building Git object payloads.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use auths_resolve_core::cache::Clock;
use auths_resolve_core::errors::ResolveError;
use auths_resolve_core::transport::{HttpResponse, HttpTransport};

pub const TEST_DID_KEY: &str = "did:key:z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp";
pub const TEST_KEY_HEX: &str = "3b6a27bcceb6a42d62a3a8d02a6f0d73653215771de243a63ac048a18b59da29";

/// A recorded outbound request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Transport answering from a list of `(url substring, response)` pairs.
/// The first matching pattern wins; unmatched URLs get a 404.
pub struct MockTransport {
    responses: Vec<(String, HttpResponse)>,
    calls: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new(responses: Vec<(&str, HttpResponse)>) -> Arc<Self> {
        Arc::new(Self {
            responses: responses
                .into_iter()
                .map(|(pattern, resp)| (pattern.to_string(), resp))
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// A transport with no canned responses.
    pub fn empty() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> Vec<RecordedRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.url).collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, ResolveError> {
        self.calls.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        for (pattern, response) in &self.responses {
            if url.contains(pattern.as_str()) {
                return Ok(response.clone());
            }
        }
        Ok(HttpResponse {
            status: 404,
            reason: "Not Found".into(),
            body: br#"{"message":"Not Found"}"#.to_vec(),
        })
    }
}

pub fn ok_json(value: Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        reason: "OK".into(),
        body: serde_json::to_vec(&value).unwrap(),
    }
}

pub fn status(code: u16, reason: &str) -> HttpResponse {
    HttpResponse {
        status: code,
        reason: reason.into(),
        body: Vec::new(),
    }
}

pub fn ref_obj(ref_path: &str, sha: &str) -> Value {
    json!({ "ref": ref_path, "object": { "sha": sha } })
}

pub fn commit(tree_sha: &str) -> HttpResponse {
    ok_json(json!({ "tree": { "sha": tree_sha } }))
}

pub fn tree(entries: &[(&str, &str)]) -> HttpResponse {
    let entries: Vec<Value> = entries
        .iter()
        .map(|(path, sha)| json!({ "path": path, "sha": sha, "type": "blob" }))
        .collect();
    ok_json(json!({ "tree": entries }))
}

pub fn base64_blob(text: &str) -> HttpResponse {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    ok_json(json!({ "content": encoded, "encoding": "base64" }))
}

pub fn identity_json(did: &str) -> String {
    json!({ "controller_did": did }).to_string()
}

pub fn attestation_json(subject: &str) -> String {
    json!({
        "version": 1,
        "rid": "test",
        "issuer": TEST_DID_KEY,
        "subject": subject,
    })
    .to_string()
}

/// Responses for a repository with one identity ref (`commit1`) and one
/// device ref (`commit2`), under the given ref-listing pattern.
pub fn identity_with_one_device(refs_pattern: &str) -> Vec<(&str, HttpResponse)> {
    vec![
        (
            refs_pattern,
            ok_json(json!([
                ref_obj("refs/auths/identity", "commit1"),
                ref_obj("refs/auths/devices/nodes/dev1/signatures", "commit2"),
            ])),
        ),
        ("git/commits/commit1", commit("tree1")),
        ("git/trees/tree1", tree(&[("identity.json", "blob1")])),
        ("git/blobs/blob1", base64_blob(&identity_json(TEST_DID_KEY))),
        ("git/commits/commit2", commit("tree2")),
        ("git/trees/tree2", tree(&[("attestation.json", "blob2")])),
        ("git/blobs/blob2", base64_blob(&attestation_json("did:key:z6MkDev1"))),
    ]
}

pub fn is_lower_hex_64(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Clock that only moves when `advance` is called.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
