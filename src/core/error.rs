use std::io;

#[derive(thiserror::Error, Debug)]
pub enum HunterError {
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout")]
    Timeout,
    #[error("http error: {0}")]
    Http(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("browser subsystem unavailable: {0}")]
    BrowserUnavailable(String),
    #[error("busy: worker pool saturated")]
    Busy,
    #[error("internal invariant violation: {0}")]
    Internal(String),
    #[error("unknown error")]
    Unknown,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl HunterError {
    /// Transient failures are worth retrying; everything else is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HunterError::Network(_) | HunterError::Timeout | HunterError::Http(_)
        )
    }
}

impl From<reqwest::Error> for HunterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HunterError::Timeout
        } else if err.is_connect() {
            HunterError::Network(err.to_string())
        } else if err.is_status() {
            HunterError::Http(err.to_string())
        } else {
            HunterError::Unknown
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for HunterError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        HunterError::Network(err.to_string())
    }
}
