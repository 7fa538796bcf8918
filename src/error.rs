//! Crate-wide error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
  /// Not enough distinct items to build well-formed multiple choice questions
  #[error("insufficient pool: {available} distinct items, need at least {required}")]
  InsufficientPool { available: usize, required: usize },

  /// Local or remote persistence failed
  #[error("storage unavailable: {0}")]
  StorageUnavailable(String),

  /// A progress or profile mutation was attempted without a signed-in user
  #[error("no authenticated user")]
  NotAuthenticated,

  /// Operation not permitted in the current state
  #[error("invalid state: {0}")]
  InvalidState(String),
}

impl From<rusqlite::Error> for CoreError {
  fn from(e: rusqlite::Error) -> Self {
    CoreError::StorageUnavailable(e.to_string())
  }
}

pub type Result<T> = std::result::Result<T, CoreError>;
