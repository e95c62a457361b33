use std::fs;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use engine_logging::{engine_error, engine_info, engine_warn};
use tutor_core::{BackendStatus, Effect, Msg, RequestId, Timestamp, UploadOutcome};
use tutor_engine::{
    ApiError, ConnectionInfo, EngineEvent, EngineHandle, HealthStatus, HistoryRepository,
    UploadFile,
};

use super::app::Event;

const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(20);

pub fn now_millis() -> Timestamp {
    Utc::now().timestamp_millis()
}

/// Executes effects: network work goes to the engine thread, history work
/// runs inline. Every outcome comes back as a [`Msg`].
pub struct EffectRunner {
    engine: Arc<EngineHandle>,
    history: Box<dyn HistoryRepository>,
    events: mpsc::Sender<Event>,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        history: Box<dyn HistoryRepository>,
        events: mpsc::Sender<Event>,
    ) -> Self {
        let runner = Self {
            engine: Arc::new(engine),
            history,
            events,
        };
        runner.spawn_event_loop();
        runner
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        self.engine.connection_info()
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SendQuestion {
                    request_id,
                    question,
                } => {
                    engine_info!(
                        "SendQuestion request_id={} len={}",
                        request_id,
                        question.len()
                    );
                    self.engine.chat(request_id, question);
                }
                Effect::UploadFile {
                    request_id,
                    path,
                    filename,
                    mime,
                } => match fs::read(&path) {
                    Ok(bytes) => {
                        engine_info!("UploadFile request_id={} path={}", request_id, path);
                        self.engine.upload(
                            request_id,
                            UploadFile {
                                filename,
                                mime,
                                bytes,
                            },
                        );
                    }
                    Err(err) => {
                        engine_warn!("Could not read {} for upload: {}", path, err);
                        self.send(Msg::UploadFinished {
                            request_id,
                            result: Err(format!("could not read {path}: {err}")),
                            at: now_millis(),
                        });
                    }
                },
                Effect::SaveChat {
                    conversation,
                    chat_id,
                    messages,
                } => match self.history.save_chat(chat_id, &messages) {
                    Ok(Some(id)) => self.send(Msg::ChatSaved { conversation, id }),
                    Ok(None) => {}
                    Err(err) => {
                        engine_error!("Failed to save chat: {}", err);
                        self.send(Msg::HistoryWriteFailed(format!(
                            "conversation not saved: {err}"
                        )));
                    }
                },
                Effect::LoadHistory => match self.history.load_history() {
                    Ok(history) => self.send(Msg::HistoryLoaded(history)),
                    Err(err) => {
                        engine_warn!("Failed to load chat history: {}", err);
                        self.send(Msg::HistoryFailed(err.to_string()));
                    }
                },
                Effect::ClearHistory => {
                    if let Err(err) = self.history.clear_history() {
                        engine_error!("Failed to clear chat history: {}", err);
                        self.send(Msg::HistoryWriteFailed(format!(
                            "history not cleared: {err}"
                        )));
                    }
                }
                Effect::CheckHealth => self.engine.check_health(),
            }
        }
    }

    fn send(&self, msg: Msg) {
        let _ = self.events.send(Event::Msg(msg));
    }

    fn spawn_event_loop(&self) {
        let engine = self.engine.clone();
        let events = self.events.clone();
        thread::spawn(move || loop {
            if let Some(event) = engine.try_recv() {
                let msg = event_to_msg(event, now_millis());
                if events.send(Event::Msg(msg)).is_err() {
                    break;
                }
            } else {
                thread::sleep(EVENT_POLL_INTERVAL);
            }
        });
    }
}

fn event_to_msg(event: EngineEvent, at: Timestamp) -> Msg {
    match event {
        EngineEvent::ChatCompleted { request_id, result } => Msg::ChatAnswered {
            request_id,
            result: result
                .map(|answer| answer.answer)
                .map_err(|err| describe_failure(request_id, &err)),
            at,
        },
        EngineEvent::UploadCompleted { request_id, result } => Msg::UploadFinished {
            request_id,
            result: result
                .map(|receipt| UploadOutcome {
                    message: receipt.message,
                    filename: receipt.filename,
                })
                .map_err(|err| describe_failure(request_id, &err)),
            at,
        },
        EngineEvent::HealthChecked(result) => Msg::HealthChecked(backend_status(&result)),
    }
}

fn describe_failure(request_id: RequestId, err: &ApiError) -> String {
    engine_warn!("Request {} failed: {}", request_id, err.kind);
    err.to_string()
}

/// A backend without an AI key still serves uploads, so it is `Limited`.
fn backend_status(result: &Result<HealthStatus, ApiError>) -> BackendStatus {
    match result {
        Ok(health) if health.groq_configured => BackendStatus::Online,
        Ok(_) => BackendStatus::Limited,
        Err(err) => {
            engine_warn!("Health check failed: {}", err.kind);
            BackendStatus::Offline
        }
    }
}
