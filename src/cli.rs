//! CLI argument parsing and conversion into commit and tag requests.
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::{ArgAction, Parser};
use regex::Regex;
use secrecy::SecretString;
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use crate::{
    error::ActionError,
    forge::config::{DEFAULT_API_BASE, RepositoryRef},
    pipeline::{CommitOptions, CommitRequest, GitUser, Organization},
    result::Result,
};

/// Env var holding the app private key, raw or base64 encoded PEM.
pub const PRIVATE_KEY_ENV_VAR: &str = "GH_APP_PRIVATE_KEY";
pub const DEFAULT_BRANCH: &str = "main";
/// Replaced by a timestamped message when left untouched.
pub const DEFAULT_COMMIT_MESSAGE: &str = "chore: autopublish ${date}";

static COAUTHOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+) <(.+)>$").unwrap());

static ON_BEHALF_OF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+) @(\S+) <(.+)>$").unwrap());

/// Commit local changes to a GitHub branch as a GitHub App.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, disable_help_flag = true)]
pub struct Args {
    #[arg(short = 'i', long)]
    /// GitHub App id, used as the JWT issuer.
    pub app_id: String,

    #[arg(short, long)]
    /// Repository in the format owner/repo.
    pub repository: String,

    #[arg(short, long, default_value = DEFAULT_BRANCH)]
    /// Branch to commit to.
    pub branch: String,

    #[arg(short = 'h', long)]
    /// Branch to commit from. Defaults to the target branch.
    pub head_branch: Option<String>,

    #[arg(short, long)]
    /// Path to the app private key PEM file. GH_APP_PRIVATE_KEY has priority.
    pub private_key_path: Option<PathBuf>,

    #[arg(short, long, default_value = DEFAULT_COMMIT_MESSAGE)]
    /// Commit message, also used for tags.
    pub message: String,

    #[arg(short, long, default_value = "")]
    /// Co-authors in the format 'Name1 <email1>, Name2 <email2>'.
    pub coauthors: String,

    #[arg(short, long, default_value = "")]
    /// Tags separated by commas, 'tag1, tag2'.
    pub tags: String,

    #[arg(
        short,
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    /// Include untracked files in the commit.
    pub add_new_files: bool,

    #[arg(short, long, default_value_t = false)]
    /// Force the branch update.
    pub force: bool,

    #[arg(long, default_value_t = false)]
    /// Remove deleted files from the committed tree.
    pub remove_deleted_files: bool,

    #[arg(long)]
    /// Organization to commit on behalf of, 'Name @slug <email>'.
    pub on_behalf_of: Option<String>,

    #[arg(long, default_value = DEFAULT_API_BASE)]
    /// GitHub API base url.
    pub api_url: String,

    #[arg(long, default_value_t = false)]
    /// Enable debug logging.
    pub debug: bool,

    #[arg(long, action = ArgAction::Help)]
    /// Print help.
    help: Option<bool>,
}

impl Args {
    pub fn repository(&self) -> Result<RepositoryRef> {
        self.repository.parse()
    }

    /// Resolve the private key from the environment or `--private-key-path`.
    pub fn private_key(&self) -> Result<SecretString> {
        resolve_private_key(
            env::var(PRIVATE_KEY_ENV_VAR).ok(),
            self.private_key_path.as_deref(),
        )
    }

    pub fn commit_message(&self, now: DateTime<Utc>) -> String {
        if self.message == DEFAULT_COMMIT_MESSAGE {
            return format!(
                "chore: autopublish {}",
                now.to_rfc3339_opts(SecondsFormat::Secs, true)
            );
        }

        self.message.clone()
    }

    pub fn tags(&self) -> Vec<String> {
        parse_tags(&self.tags)
    }

    pub fn commit_request(&self, now: DateTime<Utc>) -> Result<CommitRequest> {
        let mut builder = CommitRequest::builder();

        builder
            .branch(&self.branch)
            .message(self.commit_message(now))
            .coauthors(parse_coauthors(&self.coauthors)?)
            .options(CommitOptions {
                include_new_files: self.add_new_files,
                force: self.force,
                remove_deleted_files: self.remove_deleted_files,
            });

        if let Some(head_branch) = self.head_branch.as_deref() {
            builder.head_branch(head_branch);
        }

        if let Some(on_behalf_of) = self.on_behalf_of.as_deref() {
            builder.on_behalf_of(parse_on_behalf_of(on_behalf_of)?);
        }

        builder
            .build()
            .map_err(|e| ActionError::invalid_args(e.to_string()).into())
    }
}

/// Parse `Name1 <email1>, Name2 <email2>`. Blank input yields no co-authors.
pub fn parse_coauthors(input: &str) -> Result<Vec<GitUser>> {
    if input.trim().is_empty() {
        return Ok(vec![]);
    }

    input
        .split(',')
        .map(str::trim)
        .map(|coauthor| -> Result<GitUser> {
            let caps = COAUTHOR_REGEX.captures(coauthor).ok_or_else(|| {
                ActionError::invalid_args(format!(
                    "invalid coauthor format '{coauthor}', expected format is 'Name <email@example.com>'"
                ))
            })?;
            Ok(GitUser::new(&caps[1], &caps[2]))
        })
        .collect()
}

/// Split a comma separated tag list, dropping blank entries.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// Parse `Name @slug <email>`.
pub fn parse_on_behalf_of(input: &str) -> Result<Organization> {
    let caps = ON_BEHALF_OF_REGEX.captures(input.trim()).ok_or_else(|| {
        ActionError::invalid_args(format!(
            "invalid on-behalf-of format '{input}', expected format is 'Name @slug <email@example.com>'"
        ))
    })?;

    Ok(Organization {
        name: caps[1].to_string(),
        slug: caps[2].to_string(),
        email: caps[3].to_string(),
    })
}

/// Pick the private key from the env value first, then the key file.
///
/// The env value is decoded as base64 when that decodes to PEM text,
/// otherwise used as is.
pub fn resolve_private_key(
    env_value: Option<String>,
    path: Option<&Path>,
) -> Result<SecretString> {
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        let compact = value
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>();

        let decoded = STANDARD
            .decode(compact)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .filter(|text| text.contains("-----BEGIN"));

        return Ok(SecretString::from(decoded.unwrap_or(value)));
    }

    if let Some(path) = path {
        let pem = fs::read_to_string(path).map_err(|e| {
            ActionError::local_io(format!(
                "failed to read private key file {}: {e}",
                path.display()
            ))
        })?;
        return Ok(SecretString::from(pem));
    }

    Err(ActionError::invalid_args(format!(
        "you need to provide a private key in the environment variable {PRIVATE_KEY_ENV_VAR} or a filename with the -p flag"
    ))
    .into())
}
