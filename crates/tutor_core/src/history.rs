use crate::StoredChat;

/// Upper bound on the number of conversations kept in history.
pub const MAX_STORED_CHATS: usize = 50;

/// Conversations shorter than this are never persisted.
pub const MIN_MESSAGES_TO_PERSIST: usize = 2;

/// Inserts `chat` at the front of a most-recent-first history list.
///
/// An existing entry with the same id is replaced, and the list is truncated
/// to [`MAX_STORED_CHATS`], evicting the oldest entries.
pub fn upsert(history: &mut Vec<StoredChat>, chat: StoredChat) {
    history.retain(|existing| existing.id != chat.id);
    history.insert(0, chat);
    history.truncate(MAX_STORED_CHATS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatMessage;

    fn chat(id: i64) -> StoredChat {
        StoredChat {
            id,
            title: format!("chat {id}"),
            messages: vec![ChatMessage::user("q", id), ChatMessage::ai("a", id)],
            timestamp: id,
        }
    }

    #[test]
    fn replacing_moves_entry_to_front() {
        let mut history = vec![chat(3), chat(2), chat(1)];
        let mut updated = chat(1);
        updated.title = "renamed".to_string();

        upsert(&mut history, updated);

        let ids: Vec<_> = history.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert_eq!(history[0].title, "renamed");
    }

    #[test]
    fn cap_evicts_oldest() {
        let mut history: Vec<_> = (1..=MAX_STORED_CHATS as i64).rev().map(chat).collect();
        upsert(&mut history, chat(1000));

        assert_eq!(history.len(), MAX_STORED_CHATS);
        assert_eq!(history[0].id, 1000);
        assert!(history.iter().all(|c| c.id != 1));
    }
}
