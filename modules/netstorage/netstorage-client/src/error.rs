use std::io;
use std::path::PathBuf;

use http::StatusCode;
use thiserror::Error;

use crate::auth::SignError;
use crate::decoder::DecodeError;

/// Errors surfaced by NetStorage client operations.
///
/// Every failed call resolves with exactly one of these; nothing is retried.
#[derive(Debug, Error)]
pub enum NetStorageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signing error: {0}")]
    Signing(#[from] SignError),

    #[error("Request build error: {0}")]
    BuildError(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Local I/O error on '{}': {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed with code {status}")]
    RemoteStatus { status: StatusCode },

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl NetStorageError {
    pub(crate) fn local_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        NetStorageError::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Split transport failures the way callers usually want to report them.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetStorageError::Timeout(err.to_string())
        } else if err.is_connect() {
            NetStorageError::Connection(err.to_string())
        } else {
            NetStorageError::Network(err)
        }
    }

    /// HTTP status attached to the error, when the remote side produced one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            NetStorageError::RemoteStatus { status } => Some(*status),
            NetStorageError::Network(err) => err.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_status_message() {
        let err = NetStorageError::RemoteStatus {
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert_eq!(err.to_string(), "Failed with code 500 Internal Server Error");
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_local_io_mentions_path() {
        let err = NetStorageError::local_io(
            "/tmp/missing.bin",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/tmp/missing.bin"));
        assert!(err.status().is_none());
    }
}
