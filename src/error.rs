use std::path::PathBuf;

use thiserror::Error;

/// Terminal outcome of one send attempt. None of these are retried.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("no email address configured")]
    MissingPrecondition,
    #[error("invalid API endpoint `{0}`")]
    InvalidEndpoint(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server responded with status {0}")]
    NonSuccessStatus(u16),
    #[error("failed to serialize request: {0}")]
    Serialization(String),
}

impl SendError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingPrecondition => "E_MISSING_EMAIL",
            Self::InvalidEndpoint(_) => "E_INVALID_ENDPOINT",
            Self::Timeout(_) => "E_TIMEOUT",
            Self::Transport(_) => "E_TRANSPORT",
            Self::NonSuccessStatus(_) => "E_STATUS",
            Self::Serialization(_) => "E_SERIALIZATION",
        }
    }

    /// Short message suitable for showing to the person who pressed send.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingPrecondition => "Please set your email in Brief first".to_string(),
            Self::InvalidEndpoint(_) => "Invalid API URL".to_string(),
            Self::Timeout(_) => "The request timed out. Please try again.".to_string(),
            Self::Transport(reason) => format!("Error: {reason}"),
            Self::NonSuccessStatus(_) => "Failed to send link. Please try again.".to_string(),
            Self::Serialization(_) => "Error: the link could not be encoded".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store key `{0}` is not a valid key name")]
    InvalidKey(String),
    #[error("value for `{key}` could not be encoded: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConsentError {
    #[error("no AI summary consent request is pending")]
    NotPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("a send is already in progress")]
    InFlight,
    #[error("no link to send")]
    MissingUrl,
}
