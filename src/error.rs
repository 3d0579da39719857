//! Error types for yt-comments

use thiserror::Error;

/// Main error type for yt-comments.
///
/// Only conditions fatal to the current operation live here; silent
/// empty-result conditions (comments disabled, bootstrap extraction
/// failure, exhausted retries) end the stream without an error.
#[derive(Error, Debug)]
pub enum YtCommentsError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to set sorting: {0}")]
    Sorting(String),

    #[error("Error returned from server: {0}")]
    Server(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, YtCommentsError>;
