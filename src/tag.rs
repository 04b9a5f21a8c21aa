//! Annotated tag publication.
//!
//! A tag object is always created first. The `refs/tags/{name}` reference is
//! then probed: a 404 means the tag is new and the reference is created,
//! a successful read means it already exists and is force-moved to the new
//! tag object. Any other probe failure aborts.
use color_eyre::eyre::WrapErr;
use log::*;

use crate::{
    actions::Reporter,
    error::is_not_found,
    forge::{
        traits::GitApi,
        types::{RefRequest, TagObjectRequest},
    },
    result::Result,
};

/// Tag to publish on a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRequest {
    pub tag_name: String,
    pub message: String,
    pub commit_sha: String,
}

impl TagRequest {
    pub fn new(
        tag_name: impl Into<String>,
        message: impl Into<String>,
        commit_sha: impl Into<String>,
    ) -> Self {
        Self {
            tag_name: tag_name.into(),
            message: message.into(),
            commit_sha: commit_sha.into(),
        }
    }
}

/// What happened to the tag reference. Carries the tag object SHA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    Created(String),
    Moved(String),
}

impl TagOutcome {
    pub fn sha(&self) -> &str {
        match self {
            Self::Created(sha) | Self::Moved(sha) => sha,
        }
    }
}

pub struct TagPublisher<'a> {
    git: &'a dyn GitApi,
    reporter: &'a dyn Reporter,
}

impl<'a> TagPublisher<'a> {
    pub fn new(git: &'a dyn GitApi, reporter: &'a dyn Reporter) -> Self {
        Self { git, reporter }
    }

    pub async fn publish(&self, req: &TagRequest) -> Result<TagOutcome> {
        let tag = self
            .git
            .create_tag(TagObjectRequest::for_commit(
                &req.tag_name,
                &req.message,
                &req.commit_sha,
            ))
            .await
            .wrap_err_with(|| {
                format!("error creating tag object '{}'", req.tag_name)
            })?;

        debug!("created tag object {} for '{}'", tag.sha, req.tag_name);

        let existing = self
            .git
            .get_reference(&format!("refs/tags/{}", req.tag_name))
            .await;

        let outcome = match existing {
            Ok(_) => {
                info!("tag '{}' already exists: moving it", req.tag_name);
                self.git
                    .update_reference(
                        &format!("tags/{}", req.tag_name),
                        RefRequest::update(&tag.sha, true),
                    )
                    .await
                    .wrap_err_with(|| {
                        format!("error updating tag '{}'", req.tag_name)
                    })?;
                TagOutcome::Moved(tag.sha)
            }
            Err(err) if is_not_found(&err) => {
                self.git
                    .create_reference(RefRequest::create(
                        format!("refs/tags/{}", req.tag_name),
                        &tag.sha,
                    ))
                    .await
                    .wrap_err_with(|| {
                        format!("error creating tag '{}'", req.tag_name)
                    })?;
                TagOutcome::Created(tag.sha)
            }
            Err(err) => {
                return Err(err).wrap_err_with(|| {
                    format!("error checking tag '{}'", req.tag_name)
                });
            }
        };

        let summary = match &outcome {
            TagOutcome::Created(_) => format!(
                "Tag '{}' created on commit '{}'",
                req.tag_name, req.commit_sha
            ),
            TagOutcome::Moved(_) => format!(
                "Tag '{}' moved to commit '{}'",
                req.tag_name, req.commit_sha
            ),
        };
        info!("{summary}");

        self.reporter
            .append_summary(&summary)
            .wrap_err("error writing step summary")?;

        Ok(outcome)
    }
}
