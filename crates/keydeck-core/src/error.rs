use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeydeckError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
