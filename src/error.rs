//! Download error type
//!
//! Every way a download can fail, and the HTTP status each one maps to.

use hyper::StatusCode;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("path escapes the download directory: {0}")]
    PathTraversal(String),

    #[error("not a regular file: {0}")]
    NotAFile(String),

    #[error("request path is not valid UTF-8 after decoding")]
    InvalidEncoding,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DownloadError {
    /// Map an I/O error on `name`: absence is a 404, anything else stays an I/O failure
    pub fn from_io(err: io::Error, name: &str) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound(name.to_string())
        } else {
            Self::Io(err)
        }
    }

    /// Status code sent to the client
    ///
    /// Containment failures look exactly like missing files.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::PathTraversal(_) | Self::NotAFile(_) | Self::InvalidEncoding => {
                StatusCode::NOT_FOUND
            }
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            DownloadError::NotFound("a".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DownloadError::PathTraversal("../a".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DownloadError::NotAFile("dir".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DownloadError::InvalidEncoding.status(),
            StatusCode::NOT_FOUND
        );
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(
            DownloadError::Io(denied).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_io() {
        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert!(matches!(
            DownloadError::from_io(missing, "x.txt"),
            DownloadError::NotFound(name) if name == "x.txt"
        ));

        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(
            DownloadError::from_io(denied, "x.txt"),
            DownloadError::Io(_)
        ));
    }
}
