//! Chat history persistence.
//!
//! History is a most-recent-first JSON array of [`StoredChat`] kept under a
//! single key, rewritten wholesale on every save. [`JsonHistoryRepository`]
//! owns the encoding and list policy; a [`StorageSlot`] only moves the raw
//! string, so the backing store (file, memory) can be swapped freely.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use engine_logging::{engine_debug, engine_info, engine_warn};
use tempfile::NamedTempFile;
use thiserror::Error;
use tutor_core::{
    generate_chat_title, upsert, ChatId, ChatMessage, StoredChat, Timestamp,
    MIN_MESSAGES_TO_PERSIST,
};

/// Storage key of the history list.
pub const HISTORY_KEY: &str = "chatHistory";

/// Source of epoch-millis timestamps, injectable for tests.
pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as Timestamp)
            .unwrap_or_default()
    })
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history directory unusable: {0}")]
    StorageDir(String),
    #[error("history io error: {0}")]
    Io(#[from] io::Error),
    #[error("stored history is corrupt: {0}")]
    Corrupt(String),
    #[error("could not encode history: {0}")]
    Encode(String),
}

/// The operations the front end needs from history storage.
pub trait HistoryRepository: Send + Sync {
    fn load_history(&self) -> Result<Vec<StoredChat>, HistoryError>;

    /// Persists a conversation and returns its id, or `None` when the
    /// conversation is too short to keep.
    fn save_chat(
        &self,
        chat_id: Option<ChatId>,
        messages: &[ChatMessage],
    ) -> Result<Option<ChatId>, HistoryError>;

    fn clear_history(&self) -> Result<(), HistoryError>;
}

/// A single persistent string value.
pub trait StorageSlot: Send + Sync {
    fn read(&self) -> Result<Option<String>, HistoryError>;
    fn write(&self, value: &str) -> Result<(), HistoryError>;
    fn remove(&self) -> Result<(), HistoryError>;
}

/// `<dir>/chatHistory.json`. Writes land in a temp file next to the target
/// and are renamed over it, so a crash never leaves a half-written list.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{HISTORY_KEY}.json"))
    }

    fn prepare_dir(&self) -> Result<(), HistoryError> {
        match fs::metadata(&self.dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(HistoryError::StorageDir(format!(
                "{} is not a directory",
                self.dir.display()
            ))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&self.dir).map_err(|err| {
                    HistoryError::StorageDir(format!("cannot create {}: {err}", self.dir.display()))
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl StorageSlot for FileSlot {
    fn read(&self) -> Result<Option<String>, HistoryError> {
        match fs::read_to_string(self.path()) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, value: &str) -> Result<(), HistoryError> {
        self.prepare_dir()?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(self.path())
            .map_err(|err| HistoryError::Io(err.error))?;
        Ok(())
    }

    fn remove(&self) -> Result<(), HistoryError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process slot for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySlot {
    value: Mutex<Option<String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StorageSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>, HistoryError> {
        Ok(self.raw())
    }

    fn write(&self, value: &str) -> Result<(), HistoryError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(value.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), HistoryError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

pub struct JsonHistoryRepository<S> {
    slot: S,
    clock: Clock,
}

impl<S: StorageSlot> JsonHistoryRepository<S> {
    pub fn new(slot: S) -> Self {
        Self::with_clock(slot, system_clock())
    }

    pub fn with_clock(slot: S, clock: Clock) -> Self {
        Self { slot, clock }
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }
}

impl JsonHistoryRepository<FileSlot> {
    /// History stored as `chatHistory.json` inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(FileSlot::new(dir.to_path_buf()))
    }
}

impl<S: StorageSlot> HistoryRepository for JsonHistoryRepository<S> {
    fn load_history(&self) -> Result<Vec<StoredChat>, HistoryError> {
        let Some(text) = self.slot.read()? else {
            return Ok(Vec::new());
        };
        let history: Vec<StoredChat> =
            serde_json::from_str(&text).map_err(|err| HistoryError::Corrupt(err.to_string()))?;
        engine_debug!("Loaded {} stored chats", history.len());
        Ok(history)
    }

    fn save_chat(
        &self,
        chat_id: Option<ChatId>,
        messages: &[ChatMessage],
    ) -> Result<Option<ChatId>, HistoryError> {
        if messages.len() < MIN_MESSAGES_TO_PERSIST {
            return Ok(None);
        }

        let mut history = match self.load_history() {
            Ok(history) => history,
            Err(HistoryError::Corrupt(reason)) => {
                engine_warn!("Discarding corrupt chat history: {}", reason);
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        let now = (self.clock)();
        let id = chat_id.unwrap_or_else(|| unused_id(now, &history));
        upsert(
            &mut history,
            StoredChat {
                id,
                title: generate_chat_title(messages),
                messages: messages.to_vec(),
                timestamp: now,
            },
        );

        let encoded =
            serde_json::to_string(&history).map_err(|err| HistoryError::Encode(err.to_string()))?;
        self.slot.write(&encoded)?;
        engine_info!("Saved chat {} ({} stored)", id, history.len());
        Ok(Some(id))
    }

    fn clear_history(&self) -> Result<(), HistoryError> {
        self.slot.remove()?;
        engine_info!("Cleared chat history");
        Ok(())
    }
}

/// New chats are keyed by save time; bump on the rare same-millisecond collision.
fn unused_id(now: Timestamp, history: &[StoredChat]) -> ChatId {
    let mut id = now;
    while history.iter().any(|chat| chat.id == id) {
        id += 1;
    }
    id
}
