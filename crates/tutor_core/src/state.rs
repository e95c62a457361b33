use crate::view_model::{AppViewModel, HistoryRowView, MessageView};
use crate::{initial_message, ChatId, ChatMessage, StoredChat, Timestamp};

pub type RequestId = u64;

/// Bumped whenever a different conversation is shown, so late results for
/// the previous one can be recognized.
pub type ConversationId = u64;

/// What the conversation is waiting on, if anything.
///
/// Only one request is in flight at a time; input is disabled otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Idle,
    AwaitingAnswer {
        request_id: RequestId,
    },
    Uploading {
        request_id: RequestId,
        filename: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendStatus {
    #[default]
    Unknown,
    /// Reachable and the language model is configured.
    Online,
    /// Reachable but running without a language model.
    Limited,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    input: String,
    messages: Vec<ChatMessage>,
    current_chat_id: Option<ChatId>,
    conversation: ConversationId,
    activity: Activity,
    history: Vec<StoredChat>,
    backend: BackendStatus,
    notice: Option<Notice>,
    next_request_id: RequestId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            messages: self
                .messages
                .iter()
                .map(|m| MessageView {
                    sender: m.sender,
                    text: m.text.clone(),
                    timestamp: m.timestamp,
                })
                .collect(),
            input: self.input.clone(),
            is_typing: matches!(self.activity, Activity::AwaitingAnswer { .. }),
            uploading: match &self.activity {
                Activity::Uploading { filename, .. } => Some(filename.clone()),
                _ => None,
            },
            input_enabled: self.is_idle(),
            history: self
                .history
                .iter()
                .map(|chat| HistoryRowView {
                    id: chat.id,
                    title: chat.title.clone(),
                    timestamp: chat.timestamp,
                    is_current: self.current_chat_id == Some(chat.id),
                })
                .collect(),
            backend: self.backend,
            notice: self.notice.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn current_chat_id(&self) -> Option<ChatId> {
        self.current_chat_id
    }

    pub fn conversation(&self) -> ConversationId {
        self.conversation
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn history(&self) -> &[StoredChat] {
        &self.history
    }

    pub fn is_idle(&self) -> bool {
        self.activity == Activity::Idle
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_input(&mut self, input: String) {
        if self.input != input {
            self.input = input;
            self.mark_dirty();
        }
    }

    pub(crate) fn take_input(&mut self) -> String {
        self.mark_dirty();
        std::mem::take(&mut self.input)
    }

    pub(crate) fn allocate_request_id(&mut self) -> RequestId {
        self.next_request_id += 1;
        self.next_request_id
    }

    pub(crate) fn set_activity(&mut self, activity: Activity) {
        self.activity = activity;
        self.mark_dirty();
    }

    pub(crate) fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.mark_dirty();
    }

    pub(crate) fn set_notice(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind,
            text: text.into(),
        });
        self.mark_dirty();
    }

    pub(crate) fn clear_notice(&mut self) {
        if self.notice.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn start_new_chat(&mut self, at: Timestamp) {
        self.messages = vec![initial_message(at)];
        self.current_chat_id = None;
        self.conversation += 1;
        self.mark_dirty();
    }

    /// Replaces the conversation with a stored one. Returns false if `id` is unknown.
    pub(crate) fn open_chat(&mut self, id: ChatId) -> bool {
        let Some(chat) = self.history.iter().find(|chat| chat.id == id) else {
            return false;
        };
        self.messages = chat.messages.clone();
        self.current_chat_id = Some(id);
        self.conversation += 1;
        self.mark_dirty();
        true
    }

    pub(crate) fn set_current_chat_id(&mut self, id: ChatId) {
        self.current_chat_id = Some(id);
        self.mark_dirty();
    }

    pub(crate) fn set_history(&mut self, history: Vec<StoredChat>) {
        self.history = history;
        self.mark_dirty();
    }

    pub(crate) fn set_backend(&mut self, status: BackendStatus) {
        if self.backend != status {
            self.backend = status;
            self.mark_dirty();
        }
    }
}
