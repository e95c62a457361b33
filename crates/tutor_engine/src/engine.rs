use std::io;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;

use engine_logging::{engine_debug, engine_warn};
use tutor_core::RequestId;

use crate::{BackendClient, ConnectionInfo, EngineEvent, UploadFile};

enum EngineCommand {
    Chat {
        request_id: RequestId,
        question: String,
    },
    Upload {
        request_id: RequestId,
        file: UploadFile,
    },
    CheckHealth,
}

/// Runs backend calls on a background tokio runtime and reports results as
/// [`EngineEvent`]s.
///
/// The handle is `Sync`, so one thread can submit commands while another
/// drains events through a shared `Arc`.
pub struct EngineHandle {
    client: Arc<BackendClient>,
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
}

impl EngineHandle {
    pub fn new(client: BackendClient) -> io::Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let client = Arc::new(client);
        let worker_client = client.clone();

        thread::Builder::new()
            .name("tutor-engine".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    let client = worker_client.clone();
                    let event_tx = event_tx.clone();
                    runtime.spawn(async move {
                        handle_command(client.as_ref(), command, event_tx).await;
                    });
                }
                engine_debug!("Engine command channel closed");
            })?;

        Ok(Self {
            client,
            cmd_tx,
            event_rx: Mutex::new(event_rx),
        })
    }

    pub fn chat(&self, request_id: RequestId, question: impl Into<String>) {
        self.send(EngineCommand::Chat {
            request_id,
            question: question.into(),
        });
    }

    pub fn upload(&self, request_id: RequestId, file: UploadFile) {
        self.send(EngineCommand::Upload { request_id, file });
    }

    pub fn check_health(&self) {
        self.send(EngineCommand::CheckHealth);
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        self.client.resolver().connection_info()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_recv()
            .ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_warn!("Engine worker is gone; command dropped");
        }
    }
}

async fn handle_command(
    client: &BackendClient,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::Chat {
            request_id,
            question,
        } => EngineEvent::ChatCompleted {
            request_id,
            result: client.chat(&question).await,
        },
        EngineCommand::Upload { request_id, file } => EngineEvent::UploadCompleted {
            request_id,
            result: client.upload(file).await,
        },
        EngineCommand::CheckHealth => EngineEvent::HealthChecked(client.health().await),
    };
    let _ = event_tx.send(event);
}
