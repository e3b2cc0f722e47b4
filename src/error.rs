use thiserror::Error;

/// Failure talking to the backend. "Not found" and "unreachable" are not told
/// apart by callers; both mean the remote copy is unavailable.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("http {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("invalid api url: {0}")]
    InvalidUrl(String),
}

impl RemoteError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RemoteError::NotAuthenticated)
            || matches!(self, RemoteError::Status { status: 401, .. })
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("local store directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("local store: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("local record {key} is not valid json: {source}")]
    Corrupt {
        key: &'static str,
        source: serde_json::Error,
    },
    #[error("could not serialize {key}: {source}")]
    Serialize {
        key: &'static str,
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    InvalidQuery(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Remote(RemoteError),
}

impl From<RemoteError> for AuthError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Status {
                status: 400..=499,
                message,
            } => AuthError::Rejected(message),
            RemoteError::NotAuthenticated => AuthError::NotAuthenticated,
            other => AuthError::Remote(other),
        }
    }
}
