//! Builds a commit on GitHub out of local changes.
//!
//! The commit is assembled remotely from git data objects:
//!
//! 1. read the head reference, whose commit is both base tree and parent
//! 2. stage and list the changed paths
//! 3. upload each existing path as a blob, one at a time in input order
//! 4. create a tree on top of the base tree
//! 5. create a single-parent commit
//! 6. move the branch reference, creating the branch when the move fails
//! 7. report the new commit SHA
//!
//! Objects created before a failure are left unreferenced; nothing is
//! retried or rolled back.
use base64::{Engine, engine::general_purpose::STANDARD};
use color_eyre::eyre::WrapErr;
use derive_builder::Builder;
use log::*;

use crate::{
    actions::Reporter,
    forge::{
        traits::GitApi,
        types::{BlobRequest, NewCommit, RefRequest, TreeEntry, TreeRequest},
    },
    result::Result,
    workspace::{ChangeSource, FileSource},
};

/// A co-author credited with a `Co-authored-by` trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitUser {
    pub name: String,
    pub email: String,
}

impl GitUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Organization the commit is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub name: String,
    pub slug: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOptions {
    /// Stage untracked files too.
    pub include_new_files: bool,
    /// Force the branch update.
    pub force: bool,
    /// Send deleted paths as `sha: null` tree entries instead of leaving
    /// them out.
    pub remove_deleted_files: bool,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            include_new_files: true,
            force: false,
            remove_deleted_files: false,
        }
    }
}

/// What to commit and where to push it.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct CommitRequest {
    /// Branch to push the commit to.
    pub branch: String,
    /// Branch whose head is the base of the commit, `branch` when unset.
    #[builder(setter(into, strip_option), default)]
    pub head_branch: Option<String>,
    #[builder(default)]
    pub coauthors: Vec<GitUser>,
    #[builder(setter(into, strip_option), default)]
    pub on_behalf_of: Option<Organization>,
    pub message: String,
    #[builder(default)]
    pub options: CommitOptions,
}

impl CommitRequestBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        match &self.branch {
            Some(branch) if branch.trim().is_empty() => {
                Err("branch must not be empty".into())
            }
            _ => Ok(()),
        }
    }
}

impl CommitRequest {
    pub fn builder() -> CommitRequestBuilder {
        CommitRequestBuilder::default()
    }

    pub fn head_branch(&self) -> &str {
        self.head_branch.as_deref().unwrap_or(&self.branch)
    }
}

/// Outcome of uploading one changed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub deleted: bool,
    pub blob_sha: Option<String>,
}

impl FileChange {
    pub fn uploaded(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            deleted: false,
            blob_sha: Some(sha.into()),
        }
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            deleted: true,
            blob_sha: None,
        }
    }
}

/// Append co-author and on-behalf-of trailers to a commit message.
pub fn build_commit_message(
    message: &str,
    coauthors: &[GitUser],
    on_behalf_of: Option<&Organization>,
) -> String {
    if coauthors.is_empty() && on_behalf_of.is_none() {
        return message.to_string();
    }

    let mut full = format!("{message}\n\n");

    for coauthor in coauthors {
        full.push_str(&format!(
            "Co-authored-by: {} <{}>\n",
            coauthor.name, coauthor.email
        ));
    }

    if let Some(org) = on_behalf_of {
        full.push_str(&format!("on-behalf-of: @{} <{}>", org.slug, org.email));
    }

    full
}

/// Tree request layering the uploaded blobs over `base_tree`.
pub fn build_tree_request(
    base_tree: &str,
    changes: &[FileChange],
    remove_deleted_files: bool,
) -> TreeRequest {
    let tree = changes
        .iter()
        .filter(|change| !change.deleted || remove_deleted_files)
        .map(|change| TreeEntry::blob(&change.path, change.blob_sha.clone()))
        .collect();

    TreeRequest {
        base_tree: base_tree.to_string(),
        tree,
    }
}

/// Runs the commit steps against the git data API.
pub struct CommitPipeline<'a> {
    git: &'a dyn GitApi,
    changes: &'a dyn ChangeSource,
    files: &'a dyn FileSource,
    reporter: &'a dyn Reporter,
}

impl<'a> CommitPipeline<'a> {
    pub fn new(
        git: &'a dyn GitApi,
        changes: &'a dyn ChangeSource,
        files: &'a dyn FileSource,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            git,
            changes,
            files,
            reporter,
        }
    }

    /// Commit the working tree changes and push them to `req.branch`.
    /// Returns the new commit SHA.
    pub async fn commit_and_push(
        &self,
        req: &CommitRequest,
    ) -> Result<String> {
        let head_branch = req.head_branch();

        let head = self
            .git
            .get_reference(&format!("refs/heads/{head_branch}"))
            .await
            .wrap_err("error getting head reference")?;

        let base_sha = head.object.sha;

        debug!("head branch {head_branch} is at {base_sha}");

        let paths = self
            .collect_changes(req.options.include_new_files)
            .await
            .wrap_err("error getting files to commit")?;

        info!("found {} changed files", paths.len());

        let changes = self
            .upload_blobs(&paths)
            .await
            .wrap_err("error uploading files to GitHub")?;

        let tree_req = build_tree_request(
            &base_sha,
            &changes,
            req.options.remove_deleted_files,
        );

        debug!("tree request: {}", serde_json::to_string(&tree_req)?);

        let tree = self
            .git
            .create_tree(tree_req)
            .await
            .wrap_err("error creating tree")?;

        let message = build_commit_message(
            &req.message,
            &req.coauthors,
            req.on_behalf_of.as_ref(),
        );

        let commit = self
            .git
            .create_commit(NewCommit {
                message,
                tree: tree.sha,
                parents: vec![base_sha],
            })
            .await
            .wrap_err("error creating commit")?;

        info!("created commit: sha: {}", commit.sha);

        self.reconcile_branch(&req.branch, &commit.sha, req.options.force)
            .await
            .wrap_err("error updating reference")?;

        let summary = format!(
            "Commit '{}' pushed to branch '{}' with SHA '{}'",
            req.message, req.branch, commit.sha
        );
        info!("{summary}");

        self.reporter
            .append_summary(&summary)
            .wrap_err("error writing step summary")?;
        self.reporter
            .set_output("sha", &commit.sha)
            .wrap_err("error writing step output")?;

        Ok(commit.sha)
    }

    async fn collect_changes(
        &self,
        include_new_files: bool,
    ) -> Result<Vec<String>> {
        if include_new_files {
            self.changes.stage_changed_and_new().await?;
        } else {
            self.changes.stage_changed().await?;
        }

        self.changes.diff(true).await
    }

    async fn upload_blobs(&self, paths: &[String]) -> Result<Vec<FileChange>> {
        let mut changes = Vec::with_capacity(paths.len());

        for path in paths {
            let Some(content) = self.files.read(path).await? else {
                changes.push(FileChange::deleted(path));
                continue;
            };

            let blob = self
                .git
                .create_blob(BlobRequest::base64(STANDARD.encode(content)))
                .await
                .wrap_err_with(|| {
                    format!("error uploading file '{path}' to GitHub")
                })?;

            debug!("uploaded {path} as blob {}", blob.sha);

            changes.push(FileChange::uploaded(path, blob.sha));
        }

        Ok(changes)
    }

    /// Move the branch to `sha`; if that fails for any reason, create it.
    async fn reconcile_branch(
        &self,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<()> {
        let update = self
            .git
            .update_reference(
                &format!("heads/{branch}"),
                RefRequest::update(sha, force),
            )
            .await;

        match update {
            Ok(_) => {
                info!("target branch '{branch}' updated");
                Ok(())
            }
            Err(err) => {
                warn!("failed to update branch '{branch}': {err}");
                info!("target branch '{branch}' doesn't exist: creating it");
                self.git
                    .create_reference(RefRequest::create(
                        format!("refs/heads/{branch}"),
                        sha,
                    ))
                    .await?;
                Ok(())
            }
        }
    }
}
