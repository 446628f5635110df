//! Error type for `vouch-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl Error {
  /// Another connection holds the database lock.
  pub(crate) fn is_contention(&self) -> bool {
    matches!(
      self.sqlite_code(),
      Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
    )
  }

  pub(crate) fn is_unique_violation(&self) -> bool {
    self.extended_code() == Some(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
  }

  pub(crate) fn is_foreign_key_violation(&self) -> bool {
    self.extended_code() == Some(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
  }

  fn sqlite_failure(&self) -> Option<&rusqlite::ffi::Error> {
    match self {
      Error::Sqlite(rusqlite::Error::SqliteFailure(e, _))
      | Error::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(e, _),
      )) => Some(e),
      _ => None,
    }
  }

  fn sqlite_code(&self) -> Option<rusqlite::ErrorCode> {
    self.sqlite_failure().map(|e| e.code)
  }

  fn extended_code(&self) -> Option<i32> {
    self.sqlite_failure().map(|e| e.extended_code)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
