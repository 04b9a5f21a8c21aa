//! GitHub REST API access for the git data and app endpoints.
//!
//! Calls go through a single [`client::ApiClient`]; the [`traits`] are the
//! seams the commit and tag flows are written against.

/// API constants, connection settings and repository identity.
pub mod config;

/// Bearer-authenticated HTTP client.
pub mod client;

/// GitHub implementation of the forge traits.
pub mod github;

/// Traits for the git data and app endpoints.
pub mod traits;

/// Request and response bodies.
pub mod types;
