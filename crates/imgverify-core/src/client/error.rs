//! Transfer error type shared by upload and download.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why an upload or download produced no usable result.
///
/// `Io` is the odd one out: it means the local setup is broken (source file
/// unreadable), so the verifier propagates it instead of reporting an abort.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Server answered with something other than HTTP 200.
    #[error("HTTP {code}: {body}")]
    Status { code: u32, body: String },
    /// libcurl failed before a response arrived (connect, DNS, timeout, ...).
    #[error("transport: {0}")]
    Transport(#[from] curl::Error),
    /// Building the multipart body failed.
    #[error("multipart form: {0}")]
    Form(#[from] curl::FormError),
    /// HTTP 200 but the body is unusable (bad id JSON, short body).
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Local file could not be read.
    #[error("read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    /// HTTP status code, when the server answered at all.
    pub fn status_code(&self) -> Option<u32> {
        match self {
            TransferError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Response body for non-200 answers.
    pub fn body(&self) -> Option<&str> {
        match self {
            TransferError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_local_io(&self) -> bool {
        matches!(self, TransferError::Io { .. })
    }
}
