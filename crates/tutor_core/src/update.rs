use crate::{
    validate_upload, Activity, AppState, BackendStatus, ChatMessage, Effect, Msg, NoticeKind,
};

const CHAT_FAILED_REPLY: &str = "Oops! Something went wrong. Please try again.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started { at } => {
            state.start_new_chat(at);
            vec![Effect::LoadHistory, Effect::CheckHealth]
        }
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::SendClicked { at } => {
            if !state.is_idle() {
                return (state, Vec::new());
            }
            let question = state.take_input().trim().to_string();
            if question.is_empty() {
                return (state, Vec::new());
            }

            let request_id = state.allocate_request_id();
            state.clear_notice();
            state.push_message(ChatMessage::user(question.clone(), at));
            state.set_activity(Activity::AwaitingAnswer { request_id });
            vec![Effect::SendQuestion {
                request_id,
                question,
            }]
        }
        Msg::ChatAnswered {
            request_id,
            result,
            at,
        } => {
            if *state.activity() != (Activity::AwaitingAnswer { request_id }) {
                return (state, Vec::new());
            }
            state.set_activity(Activity::Idle);
            match result {
                Ok(answer) => {
                    state.push_message(ChatMessage::ai(answer, at));
                    vec![Effect::SaveChat {
                        conversation: state.conversation(),
                        chat_id: state.current_chat_id(),
                        messages: state.messages().to_vec(),
                    }]
                }
                Err(reason) => {
                    state.push_message(ChatMessage::ai(
                        format!("{CHAT_FAILED_REPLY}\n\n{reason}"),
                        at,
                    ));
                    state.set_notice(NoticeKind::Error, reason);
                    Vec::new()
                }
            }
        }
        Msg::FileChosen {
            path,
            filename,
            mime,
            size,
        } => {
            if !state.is_idle() {
                return (state, Vec::new());
            }
            if let Err(rejection) = validate_upload(&mime, size) {
                state.set_notice(NoticeKind::Error, format!("{filename}: {rejection}"));
                return (state, Vec::new());
            }

            let request_id = state.allocate_request_id();
            state.set_notice(NoticeKind::Info, format!("Uploading {filename}..."));
            state.set_activity(Activity::Uploading {
                request_id,
                filename: filename.clone(),
            });
            vec![Effect::UploadFile {
                request_id,
                path,
                filename,
                mime,
            }]
        }
        Msg::UploadFinished {
            request_id,
            result,
            at,
        } => {
            let Activity::Uploading {
                request_id: pending,
                filename,
            } = state.activity().clone()
            else {
                return (state, Vec::new());
            };
            if pending != request_id {
                return (state, Vec::new());
            }
            state.set_activity(Activity::Idle);
            match result {
                Ok(outcome) => {
                    state.push_message(ChatMessage::ai(
                        format!(
                            "File uploaded: {}\n\n{}\nYou can now ask questions about its content.",
                            outcome.filename, outcome.message
                        ),
                        at,
                    ));
                    state.set_notice(NoticeKind::Info, format!("{} processed", outcome.filename));
                }
                Err(reason) => {
                    state.set_notice(
                        NoticeKind::Error,
                        format!("Upload of {filename} failed: {reason}"),
                    );
                }
            }
            Vec::new()
        }
        Msg::HistoryLoaded(history) => {
            state.set_history(history);
            Vec::new()
        }
        Msg::HistoryFailed(reason) => {
            state.set_history(Vec::new());
            state.set_notice(NoticeKind::Error, format!("Chat history unavailable: {reason}"));
            Vec::new()
        }
        Msg::ChatSaved { conversation, id } => {
            // A save finishing after the user switched conversations must not
            // attach its id to the one now shown.
            if conversation == state.conversation() {
                state.set_current_chat_id(id);
            }
            vec![Effect::LoadHistory]
        }
        Msg::HistoryWriteFailed(reason) => {
            state.set_notice(NoticeKind::Error, format!("Chat history not updated: {reason}"));
            Vec::new()
        }
        Msg::ChatSelected { id } => {
            if state.is_idle() && state.open_chat(id) {
                state.clear_notice();
            }
            Vec::new()
        }
        Msg::NewChatClicked { at } => {
            if state.is_idle() {
                state.clear_notice();
                state.start_new_chat(at);
            }
            Vec::new()
        }
        Msg::ClearHistoryClicked { at } => {
            if !state.is_idle() {
                return (state, Vec::new());
            }
            state.set_history(Vec::new());
            state.clear_notice();
            state.start_new_chat(at);
            vec![Effect::ClearHistory]
        }
        Msg::StatusRequested => vec![Effect::CheckHealth],
        Msg::HealthChecked(status) => {
            state.set_backend(status);
            if status == BackendStatus::Offline {
                state.set_notice(NoticeKind::Error, "Backend unreachable");
            }
            Vec::new()
        }
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}
