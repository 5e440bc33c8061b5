//! Outbound HTTP seam.
//!
//! Adapters never touch `reqwest` directly; they issue GETs through an
//! [`HttpTransport`] so tests can substitute canned responses.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::errors::ResolveError;

/// Default `User-Agent` sent with every request. GitHub rejects requests
/// without one.
pub const DEFAULT_USER_AGENT: &str = concat!("auths-resolve/", env!("CARGO_PKG_VERSION"));

/// A raw HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Canonical reason phrase for `status` (e.g. `Not Found`).
    pub reason: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Issues GET requests on behalf of a forge adapter.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url`. `headers` are added on top of the transport's defaults.
    ///
    /// Non-2xx responses are returned as `Ok`; only failures to obtain a
    /// response at all are errors.
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, ResolveError>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self, ResolveError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(user_agent).map_err(|e| ResolveError::Transport {
            url: String::new(),
            detail: format!("invalid user agent: {}", e),
        })?;
        headers.insert(USER_AGENT, agent);
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ResolveError::Transport {
                url: String::new(),
                detail: format!("failed to build reqwest client: {}", e),
            })?;
        info!(user_agent, "created ReqwestTransport");
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, ResolveError> {
        let mut req = self.http.get(url);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        let resp = req.send().await.map_err(|e| ResolveError::Transport {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

        let status = resp.status();
        let reason = status.canonical_reason().unwrap_or("").to_string();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ResolveError::Transport {
                url: url.to_string(),
                detail: e.to_string(),
            })?
            .to_vec();
        debug!(url, status = status.as_u16(), bytes = body.len(), "GET complete");
        Ok(HttpResponse {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        let mut resp = HttpResponse {
            status: 200,
            reason: "OK".into(),
            body: b"[]".to_vec(),
        };
        assert!(resp.is_success());
        resp.status = 299;
        assert!(resp.is_success());
        resp.status = 304;
        assert!(!resp.is_success());
    }

    #[test]
    fn test_response_json() {
        let resp = HttpResponse {
            status: 200,
            reason: "OK".into(),
            body: br#"{"tree":{"sha":"t1"}}"#.to_vec(),
        };
        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value["tree"]["sha"], "t1");
    }

    #[test]
    fn test_reqwest_transport_rejects_bad_user_agent() {
        assert!(ReqwestTransport::new("bad\nagent").is_err());
        assert!(ReqwestTransport::new(DEFAULT_USER_AGENT).is_ok());
    }
}
