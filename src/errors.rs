use axum::http::StatusCode;

/// A widget resource could not be fetched.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("failed to fetch resource {url}: {reason}")]
    Fetch { url: String, reason: String },
}

/// An operation against the shared counter store was rejected.
#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    #[error("invalid counter path '{0}'")]
    InvalidPath(String),

    #[error("counter store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("counter store answered {status} for '{path}'")]
    Status { path: String, status: u16 },

    #[error("counter store rejected the operation: {0}")]
    Rejected(String),
}

#[derive(thiserror::Error, Debug)]
pub enum WidgetError {
    #[error("widget resources unavailable: {0}")]
    ResourceLoad(#[from] LoadError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("widget failed to initialize")]
    Unavailable,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::InvalidPath(_) => Self::bad_request(err.to_string()),
            other => Self::internal(other),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
