use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure. The URL is stripped as it carries the API key.
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("failed to parse response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot handle pagination when `body` is not an array")]
    PaginationNotArray,

    #[error("unexpected response body: expected {0}")]
    UnexpectedBody(&'static str),

    #[error("streamed request failed: {0}")]
    Stream(String),

    #[error("not a Decentlab address: {0}")]
    NotDecentlab(String),

    #[error("device {0} is not in any folder")]
    NoFolder(String),

    #[error("unable to find address for station: {0}")]
    StationNotFound(u32),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Request(err.without_url())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
