/// Application name
pub const APP_NAME: &str = "Causerie";

/// Versioned API prefix shared by the REST and WebSocket surfaces
pub const API_PREFIX: &str = "/v1";

/// File name the bearer credential is stored under
pub const TOKEN_FILE_NAME: &str = "token";

/// Default backend HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Bounded timeout for any single REST request, in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// How long to wait for a feed to reach `Open` before giving up, in seconds
pub const FEED_OPEN_TIMEOUT_SECS: u64 = 10;

/// Feed reconnect backoff: initial delay in milliseconds
pub const FEED_RECONNECT_BASE_MS: u64 = 500;

/// Feed reconnect backoff: delay cap in milliseconds
pub const FEED_RECONNECT_MAX_MS: u64 = 15_000;

/// Read-marker persistence retry backoff: initial delay in milliseconds
pub const STATUS_RETRY_BASE_MS: u64 = 500;

/// Read-marker persistence retry backoff: delay cap in milliseconds
pub const STATUS_RETRY_MAX_MS: u64 = 10_000;
