use std::sync::Arc;

use engine_logging::{engine_debug, engine_info, engine_warn};
use serde::Deserialize;
use serde_json::json;
use tutor_core::{validate_upload, UploadRejection};

use crate::probe::HEALTH_PATH;
use crate::resolver::{ApiRequest, EndpointResolver};
use crate::types::map_reqwest_error;
use crate::{ApiError, ChatAnswer, FailureKind, HealthStatus, UploadFile, UploadReceipt};

const UPLOAD_FALLBACK_MESSAGE: &str = "File indexed successfully.";

#[derive(Deserialize)]
struct ChatReply {
    answer: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct UploadReply {
    message: Option<String>,
    filename: Option<String>,
    error: Option<String>,
}

/// Typed wrappers over the backend's HTTP API. Every call goes through the
/// shared [`EndpointResolver`].
#[derive(Clone)]
pub struct BackendClient {
    resolver: Arc<EndpointResolver>,
}

impl BackendClient {
    pub fn new(resolver: Arc<EndpointResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    /// `POST /chat` with `{question}`.
    pub async fn chat(&self, question: &str) -> Result<ChatAnswer, ApiError> {
        engine_info!("Sending question ({} chars)", question.chars().count());
        let request = ApiRequest::post_json("/chat", json!({ "question": question }));
        let response = self.resolver.request(&request).await?;
        let reply: ChatReply = response.json().await.map_err(map_reqwest_error)?;

        match reply {
            ChatReply {
                error: Some(error), ..
            } => Err(ApiError::new(FailureKind::Backend, error)),
            ChatReply {
                answer: Some(answer),
                ..
            } => Ok(ChatAnswer { answer }),
            _ => Err(ApiError::new(
                FailureKind::InvalidResponse,
                "reply has neither answer nor error",
            )),
        }
    }

    /// `POST /upload` with the document in the multipart field `file`.
    ///
    /// Oversized or unsupported files are rejected before any network call.
    pub async fn upload(&self, file: UploadFile) -> Result<UploadReceipt, ApiError> {
        validate_upload(&file.mime, file.bytes.len() as u64).map_err(rejection_error)?;

        engine_info!(
            "Uploading {} ({} bytes, {})",
            file.filename,
            file.bytes.len(),
            file.mime
        );
        let sent_name = file.filename.clone();
        let request = ApiRequest::post_file("/upload", "file", file);
        let response = self.resolver.request(&request).await?;
        let reply: UploadReply = response.json().await.map_err(map_reqwest_error)?;

        if let Some(error) = reply.error {
            engine_warn!("Backend refused upload of {}: {}", sent_name, error);
            return Err(ApiError::new(FailureKind::Backend, error));
        }
        Ok(UploadReceipt {
            message: reply
                .message
                .unwrap_or_else(|| UPLOAD_FALLBACK_MESSAGE.to_string()),
            filename: reply.filename.unwrap_or(sent_name),
        })
    }

    /// `GET /health`, used for the status indicator.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let response = self.resolver.request(&ApiRequest::get(HEALTH_PATH)).await?;
        let status: HealthStatus = response.json().await.map_err(map_reqwest_error)?;
        engine_debug!(
            "Backend health: status={} groq_configured={}",
            status.status,
            status.groq_configured
        );
        Ok(status)
    }
}

fn rejection_error(rejection: UploadRejection) -> ApiError {
    let message = rejection.to_string();
    let kind = match rejection {
        UploadRejection::TooLarge { max_bytes, actual } => {
            FailureKind::FileTooLarge { max_bytes, actual }
        }
        UploadRejection::UnsupportedType { mime } => FailureKind::UnsupportedFileType { mime },
    };
    ApiError::new(kind, message)
}
