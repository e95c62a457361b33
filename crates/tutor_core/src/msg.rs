use crate::{BackendStatus, ChatId, ConversationId, RequestId, StoredChat, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Front end finished starting up.
    Started { at: Timestamp },
    /// User edited the question input.
    InputChanged(String),
    /// User submitted the current input as a question.
    SendClicked { at: Timestamp },
    /// Backend reply (or failure) for a question.
    ChatAnswered {
        request_id: RequestId,
        result: Result<String, String>,
        at: Timestamp,
    },
    /// User picked a document to upload.
    FileChosen {
        path: String,
        filename: String,
        mime: String,
        size: u64,
    },
    /// Backend reply (or failure) for an upload.
    UploadFinished {
        request_id: RequestId,
        result: Result<UploadOutcome, String>,
        at: Timestamp,
    },
    /// Persisted history was read.
    HistoryLoaded(Vec<StoredChat>),
    /// Persisted history could not be read.
    HistoryFailed(String),
    /// Conversation `conversation` was persisted under `id`.
    ChatSaved {
        conversation: ConversationId,
        id: ChatId,
    },
    /// Saving or clearing history failed.
    HistoryWriteFailed(String),
    /// User picked a conversation from history.
    ChatSelected { id: ChatId },
    /// User asked for a fresh conversation.
    NewChatClicked { at: Timestamp },
    /// User asked to wipe all history.
    ClearHistoryClicked { at: Timestamp },
    /// User asked for a backend status refresh.
    StatusRequested,
    /// Result of a backend health check.
    HealthChecked(BackendStatus),
    /// UI/render tick to coalesce rendering.
    Tick,
}

/// Backend confirmation of an ingested document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub message: String,
    pub filename: String,
}
