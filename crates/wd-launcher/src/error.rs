//! Error types for wd-launcher

use thiserror::Error;

/// wd-launcher error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("browserName is required")]
    MissingBrowserName,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Session start failed: {0}")]
    SessionStart(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Session close failed: {0}")]
    SessionClose(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
