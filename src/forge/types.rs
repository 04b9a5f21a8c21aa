//! Request and response bodies for the GitHub git data and app APIs.
use serde::{Deserialize, Serialize};

use crate::forge::config::{
    BLOB_ENCODING, TAG_TARGET_TYPE, TREE_BLOB_MODE, TREE_BLOB_TYPE,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefObject {
    pub sha: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// A branch or tag reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref", default)]
    pub ref_name: String,
    pub object: RefObject,
}

/// Body for creating (`ref` set) or moving (`ref` omitted) a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefRequest {
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    pub sha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

impl RefRequest {
    pub fn create(ref_name: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            ref_name: Some(ref_name.into()),
            sha: sha.into(),
            force: None,
        }
    }

    pub fn update(sha: impl Into<String>, force: bool) -> Self {
        Self {
            ref_name: None,
            sha: sha.into(),
            force: Some(force),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobRequest {
    pub content: String,
    pub encoding: String,
}

impl BlobRequest {
    pub fn base64(content: String) -> Self {
        Self {
            content,
            encoding: BLOB_ENCODING.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Blob {
    pub sha: String,
}

/// One path in a tree request. `sha: null` removes the path from the base
/// tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: Option<String>,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>, sha: Option<String>) -> Self {
        Self {
            path: path.into(),
            mode: TREE_BLOB_MODE.into(),
            kind: TREE_BLOB_TYPE.into(),
            sha,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRequest {
    pub base_tree: String,
    pub tree: Vec<TreeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tree {
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCommit {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Commit {
    pub sha: String,
}

/// Annotated tag object pointing at a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagObjectRequest {
    pub tag: String,
    pub message: String,
    pub object: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TagObjectRequest {
    pub fn for_commit(
        tag: impl Into<String>,
        message: impl Into<String>,
        commit_sha: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            message: message.into(),
            object: commit_sha.into(),
            kind: TAG_TARGET_TYPE.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagObject {
    pub sha: String,
}

/// The app installation attached to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Installation {
    pub id: u64,
    #[serde(default)]
    pub app_id: Option<u64>,
}

/// Repository-scoped access token minted for an installation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstallationToken {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}
