//! Traits related to the remote git forge
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use secrecy::SecretString;

use crate::{
    forge::{
        config::RepositoryRef,
        types::{
            Blob, BlobRequest, Commit, GitRef, Installation, InstallationToken,
            NewCommit, RefRequest, TagObject, TagObjectRequest, Tree,
            TreeRequest,
        },
    },
    result::Result,
};

/// Git data API of a single repository, authenticated with the scoped
/// installation token.
///
/// Reference paths are relative to `/repos/{owner}/{repo}/git/`, e.g.
/// `refs/heads/main` or `refs/tags/v1.0.0`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GitApi: Send + Sync {
    async fn get_reference(&self, ref_path: &str) -> Result<GitRef>;
    async fn create_blob(&self, req: BlobRequest) -> Result<Blob>;
    async fn create_tree(&self, req: TreeRequest) -> Result<Tree>;
    async fn create_commit(&self, req: NewCommit) -> Result<Commit>;
    async fn create_reference(&self, req: RefRequest) -> Result<GitRef>;
    async fn update_reference(
        &self,
        ref_path: &str,
        req: RefRequest,
    ) -> Result<GitRef>;
    async fn create_tag(&self, req: TagObjectRequest) -> Result<TagObject>;
}

/// App-level endpoints, authenticated with the signed app assertion.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AppApi: Send + Sync {
    async fn get_installation(
        &self,
        assertion: &SecretString,
        repo: &RepositoryRef,
    ) -> Result<Installation>;
    async fn create_access_token(
        &self,
        assertion: &SecretString,
        installation_id: u64,
    ) -> Result<InstallationToken>;
}
