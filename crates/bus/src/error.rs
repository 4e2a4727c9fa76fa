use thiserror::Error;

pub type Result<T> = std::result::Result<T, BusError>;

#[derive(Error, Debug)]
pub enum BusError {
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
