use thiserror::Error;

/// Failures reported to the user. None of them poison the client: after any of
/// these a fresh `start` is always allowed.
#[derive(Debug, Error)]
pub(crate) enum MonitorError {
    #[error("config link must not be blank")]
    BlankLink,
    #[error("invalid monitor endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("backend returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
