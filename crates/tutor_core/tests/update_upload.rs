use tutor_core::{
    update, validate_upload, Activity, AppState, Effect, Msg, NoticeKind, Sender, UploadOutcome,
    UploadRejection, MAX_UPLOAD_BYTES,
};

fn started() -> AppState {
    let (state, _) = update(AppState::new(), Msg::Started { at: 1 });
    state
}

fn choose(state: AppState, filename: &str, mime: &str, size: u64) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::FileChosen {
            path: format!("/tmp/{filename}"),
            filename: filename.to_string(),
            mime: mime.to_string(),
            size,
        },
    )
}

#[test]
fn six_megabyte_file_is_rejected_without_effects() {
    let (state, effects) = choose(started(), "big.pdf", "application/pdf", 6 * 1024 * 1024);

    assert!(effects.is_empty());
    assert_eq!(*state.activity(), Activity::Idle);
    let notice = state.view().notice.expect("notice");
    assert_eq!(notice.kind, NoticeKind::Error);
    assert!(notice.text.contains("too large"));
}

#[test]
fn executable_type_is_rejected() {
    assert_eq!(
        validate_upload("application/x-msdownload", 1024),
        Err(UploadRejection::UnsupportedType {
            mime: "application/x-msdownload".to_string()
        })
    );
    assert_eq!(
        validate_upload("application/pdf", MAX_UPLOAD_BYTES + 1),
        Err(UploadRejection::TooLarge {
            max_bytes: MAX_UPLOAD_BYTES,
            actual: MAX_UPLOAD_BYTES + 1
        })
    );

    let (_, effects) = choose(started(), "setup.exe", "application/x-msdownload", 1024);
    assert!(effects.is_empty());
}

#[test]
fn accepted_file_emits_upload_and_blocks_input() {
    let (state, effects) = choose(started(), "notes.pdf", "application/pdf", 2048);

    assert_eq!(
        effects,
        vec![Effect::UploadFile {
            request_id: 1,
            path: "/tmp/notes.pdf".to_string(),
            filename: "notes.pdf".to_string(),
            mime: "application/pdf".to_string(),
        }]
    );
    let view = state.view();
    assert_eq!(view.uploading.as_deref(), Some("notes.pdf"));
    assert!(!view.input_enabled);
}

#[test]
fn finished_upload_confirms_in_conversation() {
    let (state, _) = choose(started(), "notes.pdf", "application/pdf", 2048);
    let (state, effects) = update(
        state,
        Msg::UploadFinished {
            request_id: 1,
            result: Ok(UploadOutcome {
                message: "Document indexed".to_string(),
                filename: "notes.pdf".to_string(),
            }),
            at: 30,
        },
    );

    assert!(effects.is_empty());
    assert_eq!(*state.activity(), Activity::Idle);
    let last = state.messages().last().unwrap();
    assert_eq!(last.sender, Sender::Ai);
    assert!(last.text.contains("notes.pdf"));
    assert!(last.text.contains("Document indexed"));
}

#[test]
fn failed_upload_reports_and_unblocks() {
    let (state, _) = choose(started(), "notes.pdf", "application/pdf", 2048);
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            request_id: 1,
            result: Err("http status 500".to_string()),
            at: 30,
        },
    );

    let view = state.view();
    assert!(view.input_enabled);
    assert_eq!(view.messages.len(), 1);
    let notice = view.notice.unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert!(notice.text.contains("notes.pdf"));
}

#[test]
fn file_chosen_while_uploading_is_ignored() {
    let (state, _) = choose(started(), "a.pdf", "application/pdf", 10);
    let (_, effects) = choose(state, "b.pdf", "application/pdf", 10);
    assert!(effects.is_empty());
}
