use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskdeskError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("denied: {0}")]
    Denied(String),
}
