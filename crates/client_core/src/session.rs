use std::{path::Path, sync::Arc};

use shared::{domain::EntryId, protocol::ProcessRequest};
use sheet_codec::Workbook;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    attachment::Attachment,
    conversation::{Conversation, ConversationEntry, DownloadArtifact, ProcessedFile},
    error::{AttachmentError, DownloadError, SendError, ValidationError},
    transport::ProcessingTransport,
};

/// Entries appended by one completed send.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub user_entry: EntryId,
    pub reply: ConversationEntry,
}

struct SessionState {
    conversation: Conversation,
    attachment: Option<Attachment>,
}

/// Chat client state: the conversation plus the pending attachment, driven
/// through a [`ProcessingTransport`]. The lock is never held across the
/// network call; the conversation's dispatch slot keeps sends serialized.
pub struct ChatSession<T: ProcessingTransport> {
    transport: T,
    inner: Mutex<SessionState>,
}

impl<T: ProcessingTransport> ChatSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            inner: Mutex::new(SessionState {
                conversation: Conversation::new(),
                attachment: None,
            }),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Replaces the pending attachment and returns its local preview.
    pub async fn attach(&self, attachment: Attachment) -> Option<Workbook> {
        let preview = attachment.preview();
        info!(name = %attachment.name, size = attachment.bytes.len(), "attachment selected");
        self.inner.lock().await.attachment = Some(attachment);
        preview
    }

    pub async fn attach_path(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Option<Workbook>, AttachmentError> {
        let attachment = Attachment::from_path(path).await?;
        Ok(self.attach(attachment).await)
    }

    pub async fn detach(&self) -> Option<Attachment> {
        self.inner.lock().await.attachment.take()
    }

    pub async fn attachment_name(&self) -> Option<String> {
        self.inner
            .lock()
            .await
            .attachment
            .as_ref()
            .map(|attachment| attachment.name.clone())
    }

    pub async fn is_busy(&self) -> bool {
        self.inner.lock().await.conversation.is_pending()
    }

    pub async fn entries(&self) -> Vec<ConversationEntry> {
        self.inner.lock().await.conversation.entries().to_vec()
    }

    pub async fn current_file(&self) -> Option<Arc<ProcessedFile>> {
        self.inner.lock().await.conversation.current_file().cloned()
    }

    pub async fn download(&self, id: EntryId) -> Result<DownloadArtifact, DownloadError> {
        self.inner.lock().await.conversation.download(id)
    }

    pub async fn download_current(&self) -> Result<DownloadArtifact, DownloadError> {
        self.inner.lock().await.conversation.download_current()
    }

    /// Sends `text` and the pending attachment, if any.
    ///
    /// Validation and busy rejections leave the log and the attachment as
    /// they were. Once dispatched, the outcome is always an appended entry:
    /// transport failures become an error entry, not an `Err`.
    pub async fn send(&self, text: &str) -> Result<SendOutcome, SendError> {
        let (ticket, user_entry, request) = {
            let mut state = self.inner.lock().await;
            let request = ProcessRequest::new(
                text.trim(),
                state.attachment.as_ref().map(Attachment::to_base64),
            );
            if request.is_empty() {
                return Err(ValidationError::EmptyMessage.into());
            }
            let ticket = state.conversation.begin_dispatch()?;

            let attachment = state.attachment.take();
            let user_entry = state
                .conversation
                .append_user(text, attachment.as_ref().map(|a| a.name.as_str()));
            (ticket, user_entry, request)
        };

        let result = self.transport.send(&request).await;

        let mut state = self.inner.lock().await;
        let reply = match result {
            Ok(response) => state.conversation.resolve(ticket, response).clone(),
            Err(error) => {
                warn!(%error, "process request failed");
                state.conversation.fail(ticket, error.user_message()).clone()
            }
        };
        Ok(SendOutcome { user_entry, reply })
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
