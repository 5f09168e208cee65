//! Application state shared across the client's async flows.
//!
//! [`ClientState`] is the explicit dependency container: everything a
//! component needs arrives through it, nothing is discovered through
//! ambient globals.  It is created once per application session and
//! torn down (via [`logout`](ClientState::logout)) when the session
//! ends.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use causerie_net::{RestClient, RestConfig, TokenStore};
use causerie_shared::constants::{DEFAULT_HTTP_PORT, REQUEST_TIMEOUT_SECS};
use causerie_shared::User;
use causerie_store::CacheService;

use crate::error::{ClientError, Result};

/// Configuration for building a [`ClientState`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend HTTP origin, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Backend WebSocket origin, e.g. `ws://localhost:8080`.
    pub ws_base_url: String,
    /// Where the bearer credential lives.  `None` uses the platform
    /// data directory.
    pub token_path: Option<PathBuf>,
    /// Bounded per-request timeout for REST calls.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, ws_base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ws_base_url: ws_base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: format!("http://localhost:{DEFAULT_HTTP_PORT}"),
            ws_base_url: format!("ws://localhost:{DEFAULT_HTTP_PORT}"),
            token_path: None,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Central application state.
///
/// Holds the transport adapter, the per-session cache service, and
/// the authenticated user, if any.
pub struct ClientState {
    /// Stateless REST transport adapter.
    rest: Arc<RestClient>,
    /// Every cache the session holds; cleared on logout.
    caches: Arc<Mutex<CacheService>>,
    /// The authenticated user.  `None` until login or a successful
    /// session check.
    current_user: Option<User>,
    /// WebSocket origin room feeds connect to.
    ws_base_url: String,
}

impl ClientState {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let tokens = match &config.token_path {
            Some(path) => TokenStore::with_path(path.clone()),
            None => TokenStore::open()?,
        };

        let rest = RestClient::new(
            RestConfig {
                base_url: config.base_url,
                timeout: config.request_timeout,
            },
            tokens,
        )?;

        Ok(Self {
            rest: Arc::new(rest),
            caches: Arc::new(Mutex::new(CacheService::new())),
            current_user: None,
            ws_base_url: config.ws_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn rest(&self) -> &Arc<RestClient> {
        &self.rest
    }

    pub fn ws_base_url(&self) -> &str {
        &self.ws_base_url
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    pub(crate) fn set_current_user(&mut self, user: Option<User>) {
        self.current_user = user;
    }

    pub(crate) fn caches_handle(&self) -> Arc<Mutex<CacheService>> {
        self.caches.clone()
    }

    /// Lock the cache service for a short, await-free critical
    /// section.
    pub fn caches(&self) -> Result<MutexGuard<'_, CacheService>> {
        self.caches.lock().map_err(|_| ClientError::Poisoned)
    }
}
