//! TOML-based configuration for the resolver.
//!
//! Tokens are never stored in the file. `*_token_env` fields name environment
//! variables whose values are read at runtime via
//! [`ResolverConfig::resolve_env_vars`]. Every section is optional; an empty
//! file yields the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{DEFAULT_TTL_SECS, MAX_TTL_SECS};
use crate::errors::ConfigError;
use crate::forge::ForgeCredentials;
use crate::transport::DEFAULT_USER_AGENT;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level resolver configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Outbound HTTP settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a resolve result stays valid (default 300, at most one year).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: i64,
}

fn default_ttl_secs() -> i64 {
    DEFAULT_TTL_SECS
}

impl CacheConfig {
    /// TTL as a duration, clamped to `0..=MAX_TTL_SECS`.
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs.clamp(0, MAX_TTL_SECS))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// `User-Agent` header for forge API requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Environment variable holding a GitHub token.
    #[serde(default)]
    pub github_token_env: Option<String>,

    /// Environment variable holding a Gitea token.
    #[serde(default)]
    pub gitea_token_env: Option<String>,

    /// Resolved GitHub token (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub github_token: Option<String>,

    /// Resolved Gitea token.
    #[serde(skip)]
    pub gitea_token: Option<String>,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            github_token_env: None,
            gitea_token_env: None,
            github_token: None,
            gitea_token: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl ResolverConfig {
    /// Load a [`ResolverConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: ResolverConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Populate the resolved token fields from their environment variables.
    ///
    /// Missing variables log a warning and leave the token unset; requests
    /// then go out anonymously.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref env_name) = self.http.github_token_env {
            self.http.github_token = resolve_optional_env(env_name, "http.github_token_env");
        }
        if let Some(ref env_name) = self.http.gitea_token_env {
            self.http.gitea_token = resolve_optional_env(env_name, "http.gitea_token_env");
        }
        Ok(())
    }

    /// Validate that all values are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.ttl_secs".into(),
                detail: "TTL must be > 0".into(),
            });
        }
        if self.cache.ttl_secs > MAX_TTL_SECS {
            return Err(ConfigError::InvalidValue {
                field: "cache.ttl_secs".into(),
                detail: format!("TTL must be <= {} seconds", MAX_TTL_SECS),
            });
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "http.user_agent".into(),
                detail: "user agent must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Tokens to hand to the forge adapters.
    pub fn credentials(&self) -> ForgeCredentials {
        ForgeCredentials {
            github_token: self.http.github_token.clone(),
            gitea_token: self.http.gitea_token.clone(),
        }
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
