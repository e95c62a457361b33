use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Stored chats are keyed by the epoch-millis of their first save.
pub type ChatId = i64;

/// Number of characters of the first user message kept in a chat title.
pub const TITLE_MAX_CHARS: usize = 40;

pub const DEFAULT_CHAT_TITLE: &str = "New conversation";

const GREETING: &str = "Hi! I'm your study assistant.\n\n\
My goal is to help you learn by thinking things through, not by handing out ready-made answers.\n\n\
Type a question or a topic you are studying to get started. You can also /upload a PDF, DOC, DOCX or TXT file to ask about it.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub sender: Sender,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            timestamp,
        }
    }

    pub fn ai(text: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Ai,
            timestamp,
        }
    }
}

/// A persisted conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredChat {
    pub id: ChatId,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub timestamp: Timestamp,
}

/// Derives a title from the first user message: its first
/// [`TITLE_MAX_CHARS`] characters, with `...` appended when it was cut.
pub fn generate_chat_title(messages: &[ChatMessage]) -> String {
    let Some(first) = messages.iter().find(|m| m.sender == Sender::User) else {
        return DEFAULT_CHAT_TITLE.to_string();
    };

    let mut title: String = first.text.chars().take(TITLE_MAX_CHARS).collect();
    if first.text.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

/// The assistant greeting every new conversation starts with.
pub fn initial_message(at: Timestamp) -> ChatMessage {
    ChatMessage::ai(GREETING, at)
}
