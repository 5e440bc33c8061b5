//! Repository URL to forge configuration.
//!
//! Resolution rules:
//! - `github.com`  → GitHub, API base `https://api.github.com`
//! - `gitlab.com`  → GitLab, API base = the URL's origin
//! - anything else → Gitea (self-hosted), API base = the URL's origin
//!
//! A forge hint replaces the hostname inference; the API base is still
//! derived from the chosen type, so a hinted Gitea on `github.com` talks to
//! `https://github.com`.

use url::Url;

use crate::models::{ForgeConfig, ForgeType};

/// Fixed API host for GitHub.com.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Detect which forge serves `repo_url` and where its API lives.
///
/// Returns `None` for unparsable URLs, URLs without an `owner/repo` path,
/// and unrecognised hints. An empty hint counts as no hint.
pub fn detect_forge(repo_url: &str, forge_hint: Option<&str>) -> Option<ForgeConfig> {
    let url = Url::parse(repo_url).ok()?;
    let (owner, repo) = owner_and_repo(url.path())?;

    let forge_type = match forge_hint.filter(|h| !h.is_empty()) {
        Some(hint) => ForgeType::from_hint(hint)?,
        None => infer_forge_type(url.host_str()?),
    };

    let base_url = match forge_type {
        ForgeType::GitHub => GITHUB_API_URL.to_string(),
        ForgeType::Gitea | ForgeType::GitLab => origin_of(&url)?,
    };

    Some(ForgeConfig {
        forge_type,
        base_url,
        owner,
        repo,
    })
}

fn infer_forge_type(host: &str) -> ForgeType {
    if host.eq_ignore_ascii_case("github.com") {
        ForgeType::GitHub
    } else if host.eq_ignore_ascii_case("gitlab.com") {
        ForgeType::GitLab
    } else {
        ForgeType::Gitea
    }
}

/// `scheme://host[:port]`, omitting the scheme's default port.
fn origin_of(url: &Url) -> Option<String> {
    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(origin.ascii_serialization())
}

/// First two path segments after stripping a trailing slash and `.git`.
fn owner_and_repo(path: &str) -> Option<(String, String)> {
    let trimmed = path.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let trimmed = trimmed.trim_end_matches('/');

    let mut segments = trimmed.split('/').filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    Some((owner.to_string(), repo.to_string()))
}
