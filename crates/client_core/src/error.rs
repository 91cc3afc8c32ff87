use shared::domain::EntryId;
use sheet_codec::FormatError;
use thiserror::Error;

use crate::envelope::FAILED_TO_PROCESS;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    UnexpectedBody(String),
}

impl TransportError {
    /// Text shown in the failed conversation entry.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Status { message, .. } => message.clone(),
            TransportError::Network(error) if error.is_connect() => {
                format!("{FAILED_TO_PROCESS}: server unreachable")
            }
            TransportError::Network(error) if error.is_timeout() => {
                format!("{FAILED_TO_PROCESS}: request timed out")
            }
            _ => FAILED_TO_PROCESS.to_string(),
        }
    }
}

/// Rejected before anything reaches the network or the conversation log.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'{name}' is not an Excel file; please select a .xlsx or .xls file")]
    UnsupportedFileType { name: String },
    #[error("type a message or attach a file before sending")]
    EmptyMessage,
}

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("a request is already in flight")]
    Busy,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("no conversation entry {0}")]
    UnknownEntry(EntryId),
    #[error("conversation entry {0} carries no processed file")]
    NoFile(EntryId),
    #[error("no processed file available")]
    NoCurrentFile,
    #[error(transparent)]
    Format(#[from] FormatError),
}
