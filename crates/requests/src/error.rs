use thiserror::Error;

pub type Result<T> = std::result::Result<T, RequestError>;

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("unauthorized command")]
    UnauthorizedCommand,

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Bus error: {0}")]
    BusError(#[from] sysconf_bus::BusError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("{0}")]
    Other(String),
}

impl RequestError {
    /// Caller-side mistakes, as opposed to failures of the host.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::UnauthorizedCommand | Self::InvalidCommand(_) | Self::InvalidRequest(_)
        )
    }
}
