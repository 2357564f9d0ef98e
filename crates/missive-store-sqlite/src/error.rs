//! Error type for `missive-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Domain errors: not-found, referential integrity, hook refusal.
  #[error("core error: {0}")]
  Core(#[from] missive_core::Error),

  /// Transient storage failure. Safe for the caller to retry with the same
  /// inputs; the store itself never retries.
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A user-deletion cascade could not complete. The transaction was rolled
  /// back entirely; no partial cleanup was committed.
  #[error("cascade cleanup for user {user_id} failed: {source}")]
  CascadeFailed {
    user_id: Uuid,
    #[source]
    source:  Box<Error>,
  },
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self { Self::Database(e.into()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
