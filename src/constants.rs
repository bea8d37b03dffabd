//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// URL the request bar starts with
pub const DEFAULT_HTTP_URL: &str = "https://httpbin.org/get";

/// Origin the sandboxed backend emulates
pub const DEFAULT_SANDBOX_ORIGIN: &str = "http://localhost:1420";

/// Request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Elapsed-time refresh period while a request is in flight
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10;

/// Log file name, created in the configured log directory
pub const LOG_FILE_NAME: &str = "courier.log";

/// Application name
pub const APP_NAME: &str = "Courier";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
