use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tutor_core::RequestId;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ChatCompleted {
        request_id: RequestId,
        result: Result<ChatAnswer, ApiError>,
    },
    UploadCompleted {
        request_id: RequestId,
        result: Result<UploadReceipt, ApiError>,
    },
    HealthChecked(Result<HealthStatus, ApiError>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub message: String,
    pub filename: String,
}

/// A document ready to be sent to `/upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Body of `GET /health`. Unknown fields are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub groq_configured: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
    /// Base URLs tried while serving the call, in probe order.
    pub attempted: Vec<String>,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            attempted: Vec::new(),
        }
    }

    pub(crate) fn with_attempted(mut self, attempted: Vec<String>) -> Self {
        self.attempted = attempted;
        self
    }

    /// Whether a fresh endpoint might serve the call; client-side rejections
    /// and backend-reported errors never are.
    pub fn is_endpoint_failure(&self) -> bool {
        matches!(
            self.kind,
            FailureKind::HttpStatus(_) | FailureKind::Timeout | FailureKind::Network
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// No candidate endpoint answered its health probe.
    Unreachable,
    HttpStatus(u16),
    Timeout,
    Network,
    InvalidResponse,
    /// The backend answered with an `{error}` body.
    Backend,
    FileTooLarge { max_bytes: u64, actual: u64 },
    UnsupportedFileType { mime: String },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Unreachable => write!(f, "backend unreachable"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Backend => write!(f, "backend error"),
            FailureKind::FileTooLarge { max_bytes, actual } => {
                write!(f, "file too large (max {max_bytes}, actual {actual})")
            }
            FailureKind::UnsupportedFileType { mime } => {
                write!(f, "unsupported file type {mime}")
            }
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::InvalidResponse, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
