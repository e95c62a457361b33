//! Tutor core: chat data model, history policy and the pure conversation state machine.
mod chat;
mod effect;
mod history;
mod msg;
mod state;
mod update;
mod upload;
mod view_model;

pub use chat::{
    generate_chat_title, initial_message, ChatId, ChatMessage, Sender, StoredChat, Timestamp,
    DEFAULT_CHAT_TITLE, TITLE_MAX_CHARS,
};
pub use effect::Effect;
pub use history::{upsert, MAX_STORED_CHATS, MIN_MESSAGES_TO_PERSIST};
pub use msg::{Msg, UploadOutcome};
pub use state::{
    Activity, AppState, BackendStatus, ConversationId, Notice, NoticeKind, RequestId,
};
pub use update::update;
pub use upload::{
    mime_for_filename, validate_upload, UploadRejection, ALLOWED_MIME_TYPES, MAX_UPLOAD_BYTES,
};
pub use view_model::{AppViewModel, HistoryRowView, MessageView};
