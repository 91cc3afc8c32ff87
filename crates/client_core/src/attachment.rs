use std::path::Path;

use shared::domain::is_accepted_spreadsheet;
use sheet_codec::{decode, encode_base64_bytes, Workbook};
use tracing::{debug, warn};

use crate::error::{AttachmentError, ValidationError};

/// A spreadsheet picked by the user and not yet sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(
        name: impl Into<String>,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if !is_accepted_spreadsheet(&name, mime_type.as_deref()) {
            return Err(ValidationError::UnsupportedFileType { name });
        }
        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }

    /// Reads a file from disk. The type is checked before any bytes are read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AttachmentError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string());

        if !is_accepted_spreadsheet(&name, mime_type.as_deref()) {
            return Err(ValidationError::UnsupportedFileType { name }.into());
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AttachmentError::Io {
                path: path.display().to_string(),
                source,
            })?;
        debug!(%name, size = bytes.len(), "attachment loaded");
        Self::new(name, mime_type, bytes).map_err(AttachmentError::from)
    }

    pub fn to_base64(&self) -> String {
        encode_base64_bytes(&self.bytes)
    }

    /// Local preview. A file that cannot be decoded still attaches and sends.
    pub fn preview(&self) -> Option<Workbook> {
        match decode(&self.bytes) {
            Ok(workbook) => Some(workbook),
            Err(error) => {
                warn!(name = %self.name, %error, "attachment preview unavailable");
                None
            }
        }
    }
}
