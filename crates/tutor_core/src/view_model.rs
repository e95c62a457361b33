use crate::{BackendStatus, ChatId, Notice, Sender, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub messages: Vec<MessageView>,
    pub input: String,
    /// The assistant is composing an answer.
    pub is_typing: bool,
    /// Name of the document being uploaded, if any.
    pub uploading: Option<String>,
    pub input_enabled: bool,
    pub history: Vec<HistoryRowView>,
    pub backend: BackendStatus,
    pub notice: Option<Notice>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub sender: Sender,
    pub text: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRowView {
    pub id: ChatId,
    pub title: String,
    pub timestamp: Timestamp,
    pub is_current: bool,
}
