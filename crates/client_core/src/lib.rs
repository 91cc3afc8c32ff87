pub mod attachment;
pub mod conversation;
pub mod envelope;
pub mod error;
pub mod session;
pub mod transport;

pub use attachment::Attachment;
pub use conversation::{
    Conversation, ConversationEntry, DispatchTicket, DownloadArtifact, EntryState, ProcessedFile,
};
pub use error::{AttachmentError, DownloadError, SendError, TransportError, ValidationError};
pub use session::{ChatSession, SendOutcome};
pub use transport::{HttpTransport, ProcessingTransport, DEFAULT_ENDPOINT};
