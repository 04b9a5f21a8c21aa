//! GitHub App authentication lifecycle.
//!
//! A run authenticates in two steps: the app's private key signs a short
//! lived JWT (the app assertion), which is then exchanged for an access token
//! scoped to the installation on the target repository. Both values live on
//! an [`AuthContext`] owned by the caller and are set at most once; the first
//! writer wins and later attempts are ignored so in-flight requests never see
//! the credential change underneath them.
use chrono::{DateTime, Duration, Utc};
use color_eyre::eyre::WrapErr;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::*;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::{
    error::ActionError,
    forge::{
        config::{RepositoryRef, TOKEN_TTL_MINUTES},
        traits::AppApi,
    },
    result::Result,
};

/// Registered JWT claims of the app assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl AssertionClaims {
    pub fn new(issuer_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            iat: now.timestamp(),
            exp: (now + Duration::minutes(TOKEN_TTL_MINUTES)).timestamp(),
            iss: issuer_id.to_string(),
        }
    }
}

/// Access token bound to one repository installation.
#[derive(Debug, Clone)]
pub struct ScopedToken {
    pub repo: RepositoryRef,
    pub token: SecretString,
}

impl ScopedToken {
    pub fn new(repo: RepositoryRef, token: impl Into<String>) -> Self {
        Self {
            repo,
            token: SecretString::from(token.into()),
        }
    }
}

/// Sign an RS256 app assertion with a PEM encoded RSA private key.
pub fn sign_assertion(
    issuer_id: &str,
    private_key: &[u8],
    now: DateTime<Utc>,
) -> std::result::Result<SecretString, ActionError> {
    let key = EncodingKey::from_rsa_pem(private_key)
        .map_err(|e| ActionError::KeyFormat(e.to_string()))?;

    let claims = AssertionClaims::new(issuer_id, now);

    let jwt = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| ActionError::Signing(e.to_string()))?;

    Ok(SecretString::from(jwt))
}

/// Credentials for one run, shared by reference between the components that
/// need them.
#[derive(Debug, Default)]
pub struct AuthContext {
    assertion: OnceLock<std::result::Result<SecretString, ActionError>>,
    scoped: OnceLock<ScopedToken>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign the app assertion once and return the cached outcome.
    ///
    /// The first call decides the result, failure included. Later or
    /// concurrent calls get that same result even when they pass a different
    /// issuer or key.
    pub fn sign_app_assertion(
        &self,
        issuer_id: &str,
        private_key: &[u8],
    ) -> Result<SecretString> {
        let outcome = self.assertion.get_or_init(|| {
            debug!("signing app assertion for issuer {issuer_id}");
            sign_assertion(issuer_id, private_key, Utc::now())
        });

        outcome
            .clone()
            .wrap_err("failed to sign GitHub App JWT")
    }

    /// Exchange the app assertion for a token scoped to the installation on
    /// `repo`.
    pub async fn exchange_for_installation_token(
        &self,
        api: &dyn AppApi,
        assertion: &SecretString,
        repo: &RepositoryRef,
    ) -> Result<ScopedToken> {
        let installation = api
            .get_installation(assertion, repo)
            .await
            .wrap_err("error getting app installation details")?;

        info!("found app installation {} for {repo}", installation.id);

        let token = api
            .create_access_token(assertion, installation.id)
            .await
            .wrap_err("error generating installation access token")?;

        Ok(ScopedToken::new(repo.clone(), token.token))
    }

    /// Register the scoped token. Only the first registration takes effect.
    pub fn set_scoped_token(&self, token: ScopedToken) -> Result<()> {
        if token.token.expose_secret().is_empty() {
            return Err(ActionError::MissingToken.into());
        }

        if self.scoped.set(token).is_err() {
            debug!("scoped token already registered: ignoring new value");
        }

        Ok(())
    }

    pub fn scoped_token(&self) -> Result<&ScopedToken> {
        self.scoped
            .get()
            .ok_or_else(|| ActionError::NotAuthenticated.into())
    }
}
