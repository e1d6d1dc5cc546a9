use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
  #[error("network error: {0}")]
  Network(String),
  #[error("storage read error: {0}")]
  StorageRead(String),
  #[error("storage write error: {0}")]
  StorageWrite(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Network,
  StorageRead,
  StorageWrite,
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      ErrorKind::Network => "network",
      ErrorKind::StorageRead => "storage_read",
      ErrorKind::StorageWrite => "storage_write",
    };
    f.write_str(label)
  }
}

impl AppError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      AppError::Network(_) => ErrorKind::Network,
      AppError::StorageRead(_) => ErrorKind::StorageRead,
      AppError::StorageWrite(_) => ErrorKind::StorageWrite,
    }
  }

  pub fn cause(&self) -> &str {
    match self {
      AppError::Network(cause) | AppError::StorageRead(cause) | AppError::StorageWrite(cause) => {
        cause
      }
    }
  }

  /// Message shown in the error banner. Network failures already carry a
  /// readable message (status code or transport cause); storage failures are
  /// reduced to a fixed sentence.
  pub fn user_message(&self) -> String {
    match self {
      AppError::Network(cause) => cause.clone(),
      AppError::StorageRead(_) => "Could not load the wishlist.".to_string(),
      AppError::StorageWrite(_) => "Could not save the wishlist.".to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn storage_errors_hide_their_cause_from_users() {
    let read = AppError::StorageRead("malformed JSON at line 1".to_string());
    let write = AppError::StorageWrite("disk full".to_string());

    assert_eq!(read.user_message(), "Could not load the wishlist.");
    assert_eq!(write.user_message(), "Could not save the wishlist.");
    assert_eq!(write.cause(), "disk full");
    assert_eq!(write.kind().to_string(), "storage_write");
  }

  #[test]
  fn network_errors_surface_their_message() {
    let error = AppError::Network("Error 500: products could not be loaded.".to_string());
    assert_eq!(error.kind(), ErrorKind::Network);
    assert_eq!(error.user_message(), "Error 500: products could not be loaded.");
  }
}
