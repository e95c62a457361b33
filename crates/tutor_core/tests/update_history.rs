use pretty_assertions::assert_eq;
use tutor_core::{
    generate_chat_title, update, AppState, BackendStatus, ChatMessage, Effect, Msg, NoticeKind,
    StoredChat,
};

fn stored(id: i64, question: &str) -> StoredChat {
    let messages = vec![ChatMessage::user(question, id), ChatMessage::ai("answer", id + 1)];
    StoredChat {
        id,
        title: generate_chat_title(&messages),
        messages,
        timestamp: id,
    }
}

fn with_history(history: Vec<StoredChat>) -> AppState {
    let (state, _) = update(AppState::new(), Msg::Started { at: 1 });
    let (state, _) = update(state, Msg::HistoryLoaded(history));
    state
}

#[test]
fn loaded_history_is_listed_in_order() {
    let state = with_history(vec![stored(200, "newer"), stored(100, "older")]);

    let titles: Vec<_> = state.view().history.into_iter().map(|row| row.title).collect();
    assert_eq!(titles, vec!["newer".to_string(), "older".to_string()]);
}

#[test]
fn selecting_a_chat_restores_its_messages() {
    let state = with_history(vec![stored(200, "newer"), stored(100, "older")]);

    let (state, effects) = update(state, Msg::ChatSelected { id: 100 });

    assert!(effects.is_empty());
    assert_eq!(state.current_chat_id(), Some(100));
    assert_eq!(state.messages()[0].text, "older");
    let current: Vec<_> = state
        .view()
        .history
        .iter()
        .filter(|row| row.is_current)
        .map(|row| row.id)
        .collect();
    assert_eq!(current, vec![100]);
}

#[test]
fn selecting_unknown_chat_changes_nothing() {
    let mut state = with_history(vec![stored(200, "newer")]);
    state.consume_dirty();

    let (mut state, _) = update(state, Msg::ChatSelected { id: 7 });

    assert_eq!(state.current_chat_id(), None);
    assert!(!state.consume_dirty());
}

#[test]
fn new_chat_resets_to_greeting() {
    let state = with_history(vec![stored(200, "newer")]);
    let (state, _) = update(state, Msg::ChatSelected { id: 200 });

    let (state, effects) = update(state, Msg::NewChatClicked { at: 300 });

    assert!(effects.is_empty());
    assert_eq!(state.current_chat_id(), None);
    assert_eq!(state.messages().len(), 1);
    assert_eq!(state.messages()[0].timestamp, 300);
}

#[test]
fn clearing_history_empties_list_and_starts_over() {
    let state = with_history(vec![stored(200, "newer"), stored(100, "older")]);
    let (state, _) = update(state, Msg::ChatSelected { id: 100 });

    let (state, effects) = update(state, Msg::ClearHistoryClicked { at: 400 });

    assert_eq!(effects, vec![Effect::ClearHistory]);
    assert!(state.history().is_empty());
    assert_eq!(state.current_chat_id(), None);
    assert_eq!(state.messages().len(), 1);
}

#[test]
fn unreadable_history_becomes_notice() {
    let state = with_history(vec![stored(200, "newer")]);

    let (state, _) = update(state, Msg::HistoryFailed("corrupt history".to_string()));

    let view = state.view();
    assert!(view.history.is_empty());
    assert_eq!(view.notice.map(|n| n.kind), Some(NoticeKind::Error));
}

#[test]
fn health_updates_backend_indicator() {
    let state = with_history(Vec::new());
    let (state, effects) = update(state, Msg::StatusRequested);
    assert_eq!(effects, vec![Effect::CheckHealth]);

    let (state, _) = update(state, Msg::HealthChecked(BackendStatus::Limited));
    assert_eq!(state.view().backend, BackendStatus::Limited);

    let (state, _) = update(state, Msg::HealthChecked(BackendStatus::Offline));
    let view = state.view();
    assert_eq!(view.backend, BackendStatus::Offline);
    assert!(view.notice.is_some());
}

fn answered(state: AppState, question: &str, request_id: u64, at: i64) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::InputChanged(question.to_string()));
    let (state, _) = update(state, Msg::SendClicked { at });
    update(
        state,
        Msg::ChatAnswered {
            request_id,
            result: Ok("answer".to_string()),
            at: at + 1,
        },
    )
}

#[test]
fn late_save_does_not_claim_a_newer_conversation() {
    let state = with_history(Vec::new());
    let (state, effects) = answered(state, "first topic", 1, 10);
    let [Effect::SaveChat { conversation, .. }] = effects.as_slice() else {
        panic!("expected SaveChat, got {effects:?}");
    };
    let first_conversation = *conversation;

    // The user starts over before the save result comes back.
    let (state, _) = update(state, Msg::NewChatClicked { at: 20 });
    let (state, effects) = update(
        state,
        Msg::ChatSaved {
            conversation: first_conversation,
            id: 100,
        },
    );
    assert_eq!(effects, vec![Effect::LoadHistory]);
    assert_eq!(state.current_chat_id(), None);

    let (_, effects) = answered(state, "second topic", 2, 30);
    let [Effect::SaveChat {
        chat_id, messages, ..
    }] = effects.as_slice()
    else {
        panic!("expected SaveChat, got {effects:?}");
    };
    assert_eq!(*chat_id, None);
    assert_eq!(messages[1].text, "second topic");
}

#[test]
fn opening_a_chat_also_invalidates_pending_saves() {
    let state = with_history(vec![stored(200, "stored topic")]);
    let (state, _) = answered(state, "fresh topic", 1, 10);
    let pending = state.conversation();

    let (state, _) = update(state, Msg::ChatSelected { id: 200 });
    let (state, _) = update(
        state,
        Msg::ChatSaved {
            conversation: pending,
            id: 300,
        },
    );

    assert_eq!(state.current_chat_id(), Some(200));
}

#[test]
fn failed_history_write_becomes_notice() {
    let state = with_history(vec![stored(200, "newer")]);

    let (state, effects) = update(
        state,
        Msg::HistoryWriteFailed("disk full".to_string()),
    );

    assert!(effects.is_empty());
    let notice = state.view().notice.expect("notice");
    assert_eq!(notice.kind, NoticeKind::Error);
    assert!(notice.text.contains("disk full"));
    assert_eq!(state.history().len(), 1);
}
