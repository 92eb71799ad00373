//! Error types for the session engine.

/// Why a call to the QA service did not produce an answer.
///
/// The dispatcher never shows these to the user; every variant collapses into
/// the same fallback turn.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("QA service returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("response did not contain an answer")]
    MissingAnswer,
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Malformed(err.to_string())
    }
}

/// Errors surfaced by the chat engine to its embedders.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid API url: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
