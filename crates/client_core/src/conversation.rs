use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use shared::{
    domain::{spreadsheet_stem, EntryId, Role, XLSX_MIME_TYPE},
    protocol::ProcessResponse,
};
use sheet_codec::{decode_base64, decode_base64_bytes, Workbook};
use tracing::{debug, info, warn};

use crate::error::{DownloadError, SendError};

/// Lifecycle position of a single entry. User entries are `Sent` the moment
/// they are appended; assistant entries exist only once the request has
/// `Resolved` or `Failed`. The in-flight period is tracked by the conversation
/// itself, see [`Conversation::is_pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Sent,
    Resolved,
    Failed,
}

/// A file returned by the backend, decoded once on arrival.
#[derive(Debug)]
pub struct ProcessedFile {
    pub file_name: String,
    pub base64: String,
    /// `None` when the payload did not decode; the preview stays blank.
    pub workbook: Option<Workbook>,
}

impl ProcessedFile {
    fn new(file_name: String, base64: String) -> Self {
        let workbook = match decode_base64(&base64) {
            Ok(workbook) => Some(workbook),
            Err(error) => {
                warn!(%file_name, %error, "processed file preview unavailable");
                None
            }
        };
        Self {
            file_name,
            base64,
            workbook,
        }
    }

    pub fn to_artifact(&self) -> Result<DownloadArtifact, DownloadError> {
        Ok(DownloadArtifact {
            file_name: self.file_name.clone(),
            mime_type: XLSX_MIME_TYPE,
            bytes: decode_base64_bytes(&self.base64)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConversationEntry {
    pub id: EntryId,
    pub role: Role,
    pub text: Option<String>,
    pub attachment_name: Option<String>,
    pub processed_file: Option<Arc<ProcessedFile>>,
    pub file_name: Option<String>,
}

impl ConversationEntry {
    pub fn state(&self) -> EntryState {
        match self.role {
            Role::User => EntryState::Sent,
            Role::Assistant => EntryState::Resolved,
            Role::Error => EntryState::Failed,
        }
    }
}

/// Raw bytes ready to be handed to the user as a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl DownloadArtifact {
    /// Writes the artifact into `dir`. Only the last path segment of the file
    /// name is used, so a backend-supplied name cannot escape `dir`.
    pub async fn save_in(&self, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        let base = self
            .file_name
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
            .unwrap_or("processed_file.xlsx");
        let path = dir.as_ref().join(base);
        tokio::fs::write(&path, &self.bytes).await?;
        info!(path = %path.display(), size = self.bytes.len(), "processed file saved");
        Ok(path)
    }
}

/// Holds the single in-flight slot. Dropping it frees the slot, whether the
/// request finished or the future driving it was abandoned.
#[derive(Debug)]
pub struct DispatchTicket {
    busy: Arc<AtomicBool>,
}

impl Drop for DispatchTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Append-only chat log plus the "current processed file" pointer.
#[derive(Debug)]
pub struct Conversation {
    entries: Vec<ConversationEntry>,
    next_id: u64,
    busy: Arc<AtomicBool>,
    current_file: Option<Arc<ProcessedFile>>,
    original_stem: Option<String>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            busy: Arc::new(AtomicBool::new(false)),
            current_file: None,
            original_stem: None,
        }
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn entry(&self, id: EntryId) -> Option<&ConversationEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn current_file(&self) -> Option<&Arc<ProcessedFile>> {
        self.current_file.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Records what the user sent. Never fails and does not depend on the
    /// network outcome.
    pub fn append_user(&mut self, text: &str, attachment_name: Option<&str>) -> EntryId {
        if let Some(name) = attachment_name {
            self.original_stem = Some(spreadsheet_stem(name).to_string());
        }
        let text = Some(text.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        self.push(Role::User, text, attachment_name.map(str::to_string), None)
            .id
    }

    /// Claims the in-flight slot, or reports that a request is outstanding.
    pub fn begin_dispatch(&self) -> Result<DispatchTicket, SendError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SendError::Busy)?;
        debug!("dispatch slot claimed");
        Ok(DispatchTicket {
            busy: Arc::clone(&self.busy),
        })
    }

    /// Appends the assistant reply and, when it carries a file, replaces the
    /// current file pointer.
    pub fn resolve(
        &mut self,
        ticket: DispatchTicket,
        response: ProcessResponse,
    ) -> &ConversationEntry {
        if !response.success {
            warn!(message = %response.message, "backend reported success=false");
        }

        let processed_file = response.processed_file_base64.map(|base64| {
            let file_name = self.fallback_file_name(response.file_name);
            Arc::new(ProcessedFile::new(file_name, base64))
        });
        if let Some(file) = &processed_file {
            self.current_file = Some(Arc::clone(file));
        }

        drop(ticket);
        self.push(Role::Assistant, Some(response.message), None, processed_file)
    }

    pub fn fail(&mut self, ticket: DispatchTicket, message: impl Into<String>) -> &ConversationEntry {
        drop(ticket);
        self.push(Role::Error, Some(message.into()), None, None)
    }

    pub fn download(&self, id: EntryId) -> Result<DownloadArtifact, DownloadError> {
        let entry = self.entry(id).ok_or(DownloadError::UnknownEntry(id))?;
        entry
            .processed_file
            .as_ref()
            .ok_or(DownloadError::NoFile(id))?
            .to_artifact()
    }

    pub fn download_current(&self) -> Result<DownloadArtifact, DownloadError> {
        self.current_file
            .as_ref()
            .ok_or(DownloadError::NoCurrentFile)?
            .to_artifact()
    }

    fn fallback_file_name(&self, from_response: Option<String>) -> String {
        if let Some(name) = from_response.filter(|name| !name.trim().is_empty()) {
            return name;
        }
        match &self.original_stem {
            Some(stem) => format!("{stem}_processed.xlsx"),
            None => format!(
                "processed_file_{}.xlsx",
                chrono::Utc::now().timestamp_millis()
            ),
        }
    }

    fn push(
        &mut self,
        role: Role,
        text: Option<String>,
        attachment_name: Option<String>,
        processed_file: Option<Arc<ProcessedFile>>,
    ) -> &ConversationEntry {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        let file_name = processed_file.as_ref().map(|file| file.file_name.clone());
        self.entries.push(ConversationEntry {
            id,
            role,
            text,
            attachment_name,
            processed_file,
            file_name,
        });
        &self.entries[self.entries.len() - 1]
    }
}

#[cfg(test)]
#[path = "tests/conversation_tests.rs"]
mod tests;
