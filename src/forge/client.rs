//! Authenticated HTTP access to the GitHub REST API.
use color_eyre::eyre::WrapErr;
use log::*;
use reqwest::{
    Method, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
    redirect,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::ActionError,
    forge::config::{ACCEPT_HEADER, API_VERSION_HEADER, ApiConfig},
    result::Result,
};

const USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Thin client that issues one bearer-authenticated request per call.
///
/// Only `200 OK` and `201 Created` count as success. Redirects are not
/// followed, so a `3xx` surfaces as an [`ActionError::Api`] like any other
/// failure status.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_uri: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
        headers.insert(
            API_VERSION_HEADER,
            HeaderValue::from_str(&config.api_version)?,
        );

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(redirect::Policy::none())
            .build()
            .wrap_err("failed to build http client")?;

        Ok(Self {
            http,
            base_uri: config.base_uri.trim_end_matches('/').to_string(),
        })
    }

    /// Send a request and return the raw response body on success.
    pub async fn call(
        &self,
        token: &SecretString,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<String> {
        let endpoint = format!("{}{}", self.base_uri, path);

        debug!("{method} {endpoint}");

        let mut request = self
            .http
            .request(method.clone(), &endpoint)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            );

        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(body)?);
        }

        let response = request
            .send()
            .await
            .wrap_err_with(|| format!("request failed: {method} {path}"))?;

        let status = response.status();
        let text = response.text().await.wrap_err_with(|| {
            format!("failed to read response body: {method} {path}")
        })?;

        if status != StatusCode::OK && status != StatusCode::CREATED {
            debug!("{method} {path} returned {status}");
            return Err(ActionError::api(status, text).into());
        }

        Ok(text)
    }

    /// Same as [`ApiClient::call`] with typed request and response bodies.
    pub async fn call_json<B, T>(
        &self,
        token: &SecretString,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let body = body.map(serde_json::to_value).transpose()?;

        let text = self.call(token, method, path, body.as_ref()).await?;

        let parsed = serde_json::from_str(&text).wrap_err_with(|| {
            format!("failed to parse response body from {path}")
        })?;

        Ok(parsed)
    }
}
