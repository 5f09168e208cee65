//! Stateless REST transport adapter.
//!
//! One [`RestClient`] wraps a `reqwest::Client` with the backend base
//! URL and the credential store.  Every call attaches the bearer token,
//! runs under a bounded timeout, and maps non-success responses to a
//! [`RequestError`] built from the server's `{error, message}` body.
//! There is no retry policy here; callers decide what failure means.

use std::time::Duration;

use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use causerie_shared::constants::{API_PREFIX, DEFAULT_HTTP_PORT, REQUEST_TIMEOUT_SECS};
use causerie_shared::{ErrorResponse, RequestError};

use crate::error::{NetError, Result};
use crate::token::TokenStore;

/// Configuration for building a [`RestClient`].
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Backend origin, e.g. `http://localhost:8080`.  The versioned
    /// API prefix is appended per call.
    pub base_url: String,
    /// Bounded per-request timeout.
    pub timeout: Duration,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: format!("http://localhost:{DEFAULT_HTTP_PORT}"),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// The transport adapter.  Owns no request state; every call is an
/// independent request/response pair.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl RestClient {
    pub fn new(config: RestConfig, tokens: TokenStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// The credential store this client reads its bearer token from.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    /// Issue a request and map a non-success response to a typed
    /// failure.  The bearer credential is attached when present.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let mut req = self.http.request(method, self.url(path));

        if let Some(token) = self.tokens.load() {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        // The server's error body is `{error, message}`; anything else
        // degrades to a code derived from the status line.
        let err = match res.json::<ErrorResponse>().await {
            Ok(body) => RequestError::new(status.as_u16(), body.error, body.message),
            Err(_) => RequestError::from_status(status.as_u16()),
        };
        tracing::debug!(path, status = status.as_u16(), code = %err.code, "Request failed");
        Err(NetError::Request(err))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let res = self.send(Method::GET, path, None::<&()>).await?;
        Ok(res.json().await?)
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<T> {
        let res = self.send(Method::POST, path, Some(body)).await?;
        Ok(res.json().await?)
    }

    /// POST without a body (e.g. joining a server).
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let res = self.send(Method::POST, path, None::<&()>).await?;
        Ok(res.json().await?)
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<T> {
        let res = self.send(Method::PUT, path, Some(body)).await?;
        Ok(res.json().await?)
    }

    /// PATCH for endpoints that answer 204 No Content.
    pub async fn patch_no_content(
        &self,
        path: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<()> {
        self.send(Method::PATCH, path, Some(body)).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }
}
