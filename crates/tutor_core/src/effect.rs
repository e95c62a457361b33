use crate::{ChatId, ChatMessage, ConversationId, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SendQuestion {
        request_id: RequestId,
        question: String,
    },
    UploadFile {
        request_id: RequestId,
        path: String,
        filename: String,
        mime: String,
    },
    SaveChat {
        conversation: ConversationId,
        chat_id: Option<ChatId>,
        messages: Vec<ChatMessage>,
    },
    LoadHistory,
    ClearHistory,
    CheckHealth,
}
