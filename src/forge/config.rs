//! Configuration for connecting to the GitHub REST API.
use color_eyre::eyre::{WrapErr, eyre};
use regex::Regex;
use std::{fmt, str::FromStr};
use url::Url;

use crate::{error::ActionError, result::Result};

/// Default API host for github.com.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
/// Media type requested on every call.
pub const ACCEPT_HEADER: &str = "application/vnd.github+json";
/// Pinned REST API version.
pub const API_VERSION: &str = "2022-11-28";
/// Header used to pin the REST API version.
pub const API_VERSION_HEADER: &str = "x-github-api-version";
/// Lifetime of the signed app assertion in minutes.
pub const TOKEN_TTL_MINUTES: i64 = 5;
/// File mode for regular blobs in a tree.
pub const TREE_BLOB_MODE: &str = "100644";
/// Entry type for blobs in a tree.
pub const TREE_BLOB_TYPE: &str = "blob";
/// Encoding used when uploading blob content.
pub const BLOB_ENCODING: &str = "base64";
/// Object type targeted by annotated tags.
pub const TAG_TARGET_TYPE: &str = "commit";

/// Connection settings for the REST API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API base, e.g. `https://api.github.com` or a GHES `/api/v3` root.
    pub base_uri: String,
    /// Value sent in the API version header.
    pub api_version: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_API_BASE.to_string(),
            api_version: API_VERSION.to_string(),
        }
    }
}

impl ApiConfig {
    /// Create configuration for a custom API base, validating the URL.
    pub fn with_base_uri(base_uri: &str) -> Result<Self> {
        let parsed = Url::parse(base_uri)
            .wrap_err_with(|| format!("invalid API url: {base_uri}"))?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(eyre!(
                    "only http and https schemes are supported for the API url: got {scheme}"
                ));
            }
        }

        Ok(Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
            ..Self::default()
        })
    }
}

/// Immutable identifier of the target repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Prefix for every git data route of this repository.
    pub fn git_path(&self, rest: &str) -> String {
        format!("/repos/{}/{}/git/{rest}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryRef {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        let re = Regex::new(r"^([a-zA-Z0-9_.-]+)/([a-zA-Z0-9_.-]+)$")?;

        let captures = re.captures(s.trim()).ok_or_else(|| {
            ActionError::invalid_args(format!(
                "invalid repository format '{s}', expected format is 'owner/repo'"
            ))
        })?;

        Ok(Self::new(&captures[1], &captures[2]))
    }
}
