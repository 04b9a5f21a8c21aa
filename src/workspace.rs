//! Local working tree access: which paths changed and what they contain.
//!
//! Staging and diffing are delegated to the `git` executable; this crate
//! never reads or writes the object database itself.
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use log::*;
use std::{io::ErrorKind, path::PathBuf};
use tokio::{fs, process::Command};

use crate::{error::ActionError, result::Result};

/// Source of the changed paths to commit.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Stage modifications and deletions of tracked files.
    async fn stage_changed(&self) -> Result<()>;
    /// Stage everything, untracked files included.
    async fn stage_changed_and_new(&self) -> Result<()>;
    /// Paths that differ from HEAD, from the index when `staged`.
    async fn diff(&self, staged: bool) -> Result<Vec<String>>;
}

/// Reads file content relative to the working tree.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Full file content, or `None` when the path no longer exists.
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>>;
}

/// [`ChangeSource`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        debug!("running: git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await
            .map_err(|e| {
                ActionError::local_io(format!("failed to run git: {e}"))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("git {} failed: {}", args.join(" "), stderr.trim());
            return Err(ActionError::local_io(format!(
                "git {} exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            ))
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Root of the working tree containing `workdir`. Diff paths are
    /// relative to it.
    pub async fn toplevel(&self) -> Result<PathBuf> {
        let output = self.git(&["rev-parse", "--show-toplevel"]).await?;
        let root = output.trim_end_matches(['\n', '\r']);

        if root.is_empty() {
            return Err(ActionError::local_io(format!(
                "{} is not inside a git working tree",
                self.workdir.display()
            ))
            .into());
        }

        Ok(PathBuf::from(root))
    }
}

/// Split `git diff --name-only -z` output into paths.
///
/// Paths are NUL terminated and never quoted, so names with spaces,
/// newlines or non-ASCII characters come back verbatim.
pub fn parse_name_only(output: &str) -> Vec<String> {
    output
        .split('\0')
        .filter(|path| !path.is_empty())
        .map(String::from)
        .collect()
}

#[async_trait]
impl ChangeSource for GitCli {
    async fn stage_changed(&self) -> Result<()> {
        self.git(&["add", "-u"]).await?;
        Ok(())
    }

    async fn stage_changed_and_new(&self) -> Result<()> {
        self.git(&["add", "-A"]).await?;
        Ok(())
    }

    async fn diff(&self, staged: bool) -> Result<Vec<String>> {
        let mut args = vec!["diff", "--name-only", "-z"];
        if staged {
            args.push("--cached");
        }

        let output = self.git(&args).await?;

        Ok(parse_name_only(&output))
    }
}

/// [`FileSource`] reading from a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalFiles {
    root: PathBuf,
}

impl LocalFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileSource for LocalFiles {
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.root.join(path)).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("file '{path}' was deleted");
                Ok(None)
            }
            Err(err) => Err(ActionError::local_io(format!(
                "error reading file '{path}': {err}"
            ))
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let status = std::process::Command::new("git")
            .args(["init", "-q"])
            .current_dir(dir.path())
            .status()
            .unwrap();
        assert!(status.success());
        dir
    }

    #[test]
    fn parses_diff_output() {
        let output = "src/main.rs\0README.md\0docs/a b.md\0line\nbreak.txt\0";
        assert_eq!(
            parse_name_only(output),
            vec!["src/main.rs", "README.md", "docs/a b.md", "line\nbreak.txt"]
        );
        assert!(parse_name_only("").is_empty());
    }

    #[tokio::test]
    async fn diff_keeps_non_ascii_paths_readable() {
        let repo = init_repo();
        std::fs::write(repo.path().join("café.txt"), "bonjour").unwrap();
        std::fs::write(repo.path().join("plain.txt"), "hello").unwrap();

        let git = GitCli::new(repo.path());
        git.stage_changed_and_new().await.unwrap();

        let mut paths = git.diff(true).await.unwrap();
        paths.sort();
        assert_eq!(paths, vec!["café.txt", "plain.txt"]);

        let files = LocalFiles::new(repo.path());
        assert_eq!(
            files.read("café.txt").await.unwrap(),
            Some(b"bonjour".to_vec())
        );
    }

    #[tokio::test]
    async fn subdirectory_paths_resolve_from_toplevel() {
        let repo = init_repo();
        let sub = repo.path().join("sub");
        std::fs::create_dir_all(&sub).unwrap();
        std::fs::write(sub.join("a.txt"), "content").unwrap();

        let git = GitCli::new(&sub);
        let root = git.toplevel().await.unwrap();
        assert_eq!(
            root.canonicalize().unwrap(),
            repo.path().canonicalize().unwrap()
        );

        git.stage_changed_and_new().await.unwrap();
        let paths = git.diff(true).await.unwrap();
        assert_eq!(paths, vec!["sub/a.txt"]);

        let files = LocalFiles::new(root);
        assert_eq!(
            files.read("sub/a.txt").await.unwrap(),
            Some(b"content".to_vec())
        );
    }

    #[tokio::test]
    async fn toplevel_outside_repository_is_local_io() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::new(dir.path().join("missing"));

        let err = git.toplevel().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActionError>(),
            Some(ActionError::LocalIo(_))
        ));
    }

    #[tokio::test]
    async fn reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/a.txt"), b"hello").unwrap();

        let files = LocalFiles::new(dir.path());
        let content = files.read("nested/a.txt").await.unwrap();

        assert_eq!(content, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let files = LocalFiles::new(dir.path());

        assert_eq!(files.read("gone.txt").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreadable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a-directory")).unwrap();
        let files = LocalFiles::new(dir.path());

        let err = files.read("a-directory").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActionError>(),
            Some(ActionError::LocalIo(_))
        ));
    }

    #[tokio::test]
    async fn git_failure_is_local_io() {
        let dir = tempfile::tempdir().unwrap();
        // not a repository, so git exits non-zero (or cannot be spawned)
        let git = GitCli::new(dir.path().join("missing"));

        let err = git.diff(true).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActionError>(),
            Some(ActionError::LocalIo(_))
        ));
    }
}
