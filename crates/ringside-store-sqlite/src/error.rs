//! Error type for `ringside-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A lifecycle rule rejected the operation; nothing was written.
  #[error(transparent)]
  Core(#[from] ringside_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unrecognised stored value: {0}")]
  Decode(String),
}

impl Error {
  /// The lifecycle failure behind this error, if it is one.
  pub fn lifecycle(&self) -> Option<&ringside_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
