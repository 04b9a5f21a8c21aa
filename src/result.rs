//! Error handling and result types for gh-app-commit.
//!
//! Functions that can fail return the `Result<T>` type defined here. Errors
//! gain context with `.wrap_err()` as they travel up from the API client
//! through the pipeline to `main`, where `color-eyre` renders the full chain.
//!
//! Classified failures (see [`crate::error::ActionError`]) stay reachable
//! through the context layers with `Report::downcast_ref`.
//!
//! ```rust,ignore
//! use color_eyre::eyre::WrapErr;
//! use crate::result::Result;
//!
//! async fn read_head(git: &dyn GitApi, branch: &str) -> Result<GitRef> {
//!     git.get_reference(&format!("refs/heads/{branch}"))
//!         .await
//!         .wrap_err("error getting head reference")
//! }
//! ```

use color_eyre::eyre::Result as EyreResult;

/// Standard result type used throughout gh-app-commit.
pub type Result<T> = EyreResult<T>;
