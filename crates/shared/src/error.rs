use thiserror::Error;

/// Failure raised by a city directory backend. Variants carry the rendered
/// cause as a string so this crate stays free of transport dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("backend returned unexpected status {status}")]
    UnexpectedStatus { status: u16 },
    #[error("could not decode backend payload: {0}")]
    Decode(String),
    #[error("document store failure: {0}")]
    Store(String),
}

impl DirectoryError {
    pub fn transport(cause: impl ToString) -> Self {
        Self::Transport(cause.to_string())
    }

    pub fn decode(cause: impl ToString) -> Self {
        Self::Decode(cause.to_string())
    }

    pub fn store(cause: impl ToString) -> Self {
        Self::Store(cause.to_string())
    }
}
