//! Command execution: authenticate as the app, commit, then tag.
use chrono::Utc;
use color_eyre::eyre::WrapErr;
use log::*;
use secrecy::ExposeSecret;
use std::{env, sync::Arc};

use crate::{
    actions::{GithubActions, Reporter},
    auth::AuthContext,
    cli::Args,
    error::ActionError,
    forge::{
        client::ApiClient, config::ApiConfig, github::Github, traits::GitApi,
    },
    pipeline::{CommitPipeline, CommitRequest},
    result::Result,
    tag::{TagPublisher, TagRequest},
    workspace::{ChangeSource, FileSource, GitCli, LocalFiles},
};

/// Run the whole flow for the parsed CLI arguments.
pub async fn execute(args: &Args) -> Result<()> {
    let repo = args.repository()?;
    let request = args.commit_request(Utc::now())?;
    let private_key = args.private_key()?;

    info!("publishing to {repo} on branch '{}'", request.branch);

    let config = ApiConfig::with_base_uri(&args.api_url)?;
    let client = ApiClient::new(&config)?;
    let auth = Arc::new(AuthContext::new());
    let github = Github::new(client, Arc::clone(&auth));

    let assertion = auth.sign_app_assertion(
        &args.app_id,
        private_key.expose_secret().as_bytes(),
    )?;

    let scoped = auth
        .exchange_for_installation_token(&github, &assertion, &repo)
        .await
        .wrap_err("failed to generate installation token")?;

    auth.set_scoped_token(scoped)
        .wrap_err("failed to set GitHub App token")?;

    let workdir = env::current_dir().map_err(|e| {
        ActionError::local_io(format!(
            "failed to resolve working directory: {e}"
        ))
    })?;

    let root = GitCli::new(&workdir)
        .toplevel()
        .await
        .wrap_err("failed to locate the git working tree")?;

    debug!("working tree root: {}", root.display());

    let changes = GitCli::new(&root);
    let files = LocalFiles::new(&root);
    let reporter = GithubActions::from_env();

    publish(&github, &changes, &files, &reporter, &request, &args.tags())
        .await?;

    Ok(())
}

/// Commit and push, then publish every tag on the new commit with the
/// commit message. Returns the commit SHA.
pub async fn publish(
    git: &dyn GitApi,
    changes: &dyn ChangeSource,
    files: &dyn FileSource,
    reporter: &dyn Reporter,
    request: &CommitRequest,
    tags: &[String],
) -> Result<String> {
    let pipeline = CommitPipeline::new(git, changes, files, reporter);

    let commit_sha = pipeline
        .commit_and_push(request)
        .await
        .wrap_err("failed to commit and push")?;

    let publisher = TagPublisher::new(git, reporter);

    for tag in tags {
        let req = TagRequest::new(tag, &request.message, &commit_sha);
        let outcome = publisher
            .publish(&req)
            .await
            .wrap_err_with(|| format!("failed to create tag '{tag}'"))?;
        debug!("tag '{tag}' points at tag object {}", outcome.sha());
    }

    Ok(commit_sha)
}
