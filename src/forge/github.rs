//! Implements the git data and app traits for GitHub
use async_trait::async_trait;
use log::*;
use reqwest::Method;
use secrecy::SecretString;
use std::sync::Arc;

use crate::{
    auth::{AuthContext, ScopedToken},
    forge::{
        client::ApiClient,
        config::RepositoryRef,
        traits::{AppApi, GitApi},
        types::{
            Blob, BlobRequest, Commit, GitRef, Installation, InstallationToken,
            NewCommit, RefRequest, TagObject, TagObjectRequest, Tree,
            TreeRequest,
        },
    },
    result::Result,
};

/// GitHub forge implementation talking to the REST API through
/// [`ApiClient`].
///
/// Git data calls read the scoped token from the shared [`AuthContext`] on
/// every call and fail before touching the network when none has been
/// registered yet.
pub struct Github {
    client: ApiClient,
    auth: Arc<AuthContext>,
}

impl Github {
    pub fn new(client: ApiClient, auth: Arc<AuthContext>) -> Self {
        Self { client, auth }
    }

    fn scoped(&self) -> Result<&ScopedToken> {
        self.auth.scoped_token()
    }

    async fn post<B, T>(&self, rest: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        let scoped = self.scoped()?;
        let path = scoped.repo.git_path(rest);
        self.client
            .call_json(&scoped.token, Method::POST, &path, Some(body))
            .await
    }
}

#[async_trait]
impl GitApi for Github {
    async fn get_reference(&self, ref_path: &str) -> Result<GitRef> {
        let scoped = self.scoped()?;
        let path = scoped.repo.git_path(ref_path);
        self.client
            .call_json::<(), _>(&scoped.token, Method::GET, &path, None)
            .await
    }

    async fn create_blob(&self, req: BlobRequest) -> Result<Blob> {
        self.post("blobs", &req).await
    }

    async fn create_tree(&self, req: TreeRequest) -> Result<Tree> {
        info!("creating tree starting from: {}", req.base_tree);

        let tree: Tree = self.post("trees", &req).await?;

        info!("created new tree: {}", tree.sha);

        Ok(tree)
    }

    async fn create_commit(&self, req: NewCommit) -> Result<Commit> {
        self.post("commits", &req).await
    }

    async fn create_reference(&self, req: RefRequest) -> Result<GitRef> {
        self.post("refs", &req).await
    }

    async fn update_reference(
        &self,
        ref_path: &str,
        req: RefRequest,
    ) -> Result<GitRef> {
        let scoped = self.scoped()?;
        let path = scoped.repo.git_path(&format!("refs/{ref_path}"));
        self.client
            .call_json(&scoped.token, Method::PATCH, &path, Some(&req))
            .await
    }

    async fn create_tag(&self, req: TagObjectRequest) -> Result<TagObject> {
        self.post("tags", &req).await
    }
}

#[async_trait]
impl AppApi for Github {
    async fn get_installation(
        &self,
        assertion: &SecretString,
        repo: &RepositoryRef,
    ) -> Result<Installation> {
        let path = format!("/repos/{}/{}/installation", repo.owner, repo.name);
        self.client
            .call_json::<(), _>(assertion, Method::GET, &path, None)
            .await
    }

    async fn create_access_token(
        &self,
        assertion: &SecretString,
        installation_id: u64,
    ) -> Result<InstallationToken> {
        let path = format!("/app/installations/{installation_id}/access_tokens");
        self.client
            .call_json::<(), _>(assertion, Method::POST, &path, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        error::ActionError,
        forge::{config::ApiConfig, types::TreeEntry},
        test_helpers::{StubResponse, serve_once},
    };

    fn github_for(base_uri: &str, auth: Arc<AuthContext>) -> Github {
        let config = ApiConfig {
            base_uri: base_uri.to_string(),
            ..ApiConfig::default()
        };
        Github::new(ApiClient::new(&config).unwrap(), auth)
    }

    fn authenticated() -> Arc<AuthContext> {
        let auth = AuthContext::new();
        auth.set_scoped_token(ScopedToken::new(
            RepositoryRef::new("octo", "hello"),
            "ghs_scoped",
        ))
        .unwrap();
        Arc::new(auth)
    }

    #[tokio::test]
    async fn fails_without_scoped_token() {
        // nothing listens on this port
        let github =
            github_for("http://127.0.0.1:1", Arc::new(AuthContext::new()));

        let err = github.get_reference("refs/heads/main").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ActionError>(),
            Some(&ActionError::NotAuthenticated)
        );

        let err = github
            .create_blob(BlobRequest::base64("aGk=".into()))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ActionError>(),
            Some(&ActionError::NotAuthenticated)
        );
    }

    #[tokio::test]
    async fn reads_reference_with_scoped_token() {
        let (base, request) = serve_once(StubResponse::new(
            200,
            r#"{"ref":"refs/heads/main","object":{"sha":"base1","type":"commit"}}"#,
        ))
        .await;
        let github = github_for(&base, authenticated());

        let git_ref = github.get_reference("refs/heads/main").await.unwrap();
        assert_eq!(git_ref.object.sha, "base1");

        let request = request.await.unwrap();
        assert!(request.starts_with("GET /repos/octo/hello/git/refs/heads/main "));
        assert!(request.contains("authorization: Bearer ghs_scoped"));
    }

    #[tokio::test]
    async fn posts_tree_to_repository() {
        let (base, request) =
            serve_once(StubResponse::new(201, r#"{"sha":"tree-sha"}"#)).await;
        let github = github_for(&base, authenticated());

        let tree = github
            .create_tree(TreeRequest {
                base_tree: "base1".into(),
                tree: vec![TreeEntry::blob("a.txt", Some("blobA".into()))],
            })
            .await
            .unwrap();
        assert_eq!(tree.sha, "tree-sha");

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /repos/octo/hello/git/trees "));
        let body = request.split("\r\n\r\n").nth(1).unwrap();
        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(
            body,
            json!({
                "base_tree": "base1",
                "tree": [{"path": "a.txt", "mode": "100644", "type": "blob", "sha": "blobA"}]
            })
        );
    }

    #[tokio::test]
    async fn patches_reference_under_refs() {
        let (base, request) = serve_once(StubResponse::new(
            200,
            r#"{"ref":"refs/heads/dev","object":{"sha":"commit-sha","type":"commit"}}"#,
        ))
        .await;
        let github = github_for(&base, authenticated());

        github
            .update_reference("heads/dev", RefRequest::update("commit-sha", true))
            .await
            .unwrap();

        let request = request.await.unwrap();
        assert!(request.starts_with("PATCH /repos/octo/hello/git/refs/heads/dev "));
        assert!(request.ends_with(r#"{"sha":"commit-sha","force":true}"#));
    }

    #[tokio::test]
    async fn looks_up_installation_with_assertion() {
        let (base, request) =
            serve_once(StubResponse::new(200, r#"{"id":42,"app_id":7}"#)).await;
        let github = github_for(&base, Arc::new(AuthContext::new()));

        let assertion = SecretString::from("signed.jwt.value".to_string());
        let installation = github
            .get_installation(&assertion, &RepositoryRef::new("octo", "hello"))
            .await
            .unwrap();
        assert_eq!(installation.id, 42);

        let request = request.await.unwrap();
        assert!(request.starts_with("GET /repos/octo/hello/installation "));
        assert!(request.contains("authorization: Bearer signed.jwt.value"));
    }

    #[tokio::test]
    async fn mints_access_token_for_installation() {
        let (base, request) = serve_once(StubResponse::new(
            201,
            r#"{"token":"ghs_new","expires_at":"2026-10-18T12:00:00Z"}"#,
        ))
        .await;
        let github = github_for(&base, Arc::new(AuthContext::new()));

        let assertion = SecretString::from("signed.jwt.value".to_string());
        let token = github.create_access_token(&assertion, 42).await.unwrap();
        assert_eq!(token.token, "ghs_new");

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /app/installations/42/access_tokens "));
    }
}
