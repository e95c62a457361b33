//! Tutor engine: backend discovery, HTTP API calls and history persistence.
mod api;
mod candidates;
mod engine;
mod history;
mod probe;
mod resolver;
mod types;

pub use api::BackendClient;
pub use candidates::{
    CandidateGenerator, DiscoverySettings, StaticCandidates, SubnetScanCandidates,
    DEFAULT_BACKEND_PORT,
};
pub use engine::EngineHandle;
pub use history::{
    system_clock, Clock, FileSlot, HistoryError, HistoryRepository, JsonHistoryRepository,
    MemorySlot, StorageSlot, HISTORY_KEY,
};
pub use probe::{HttpProber, Prober, HEALTH_PATH};
pub use resolver::{ApiRequest, ConnectionInfo, EndpointResolver, RequestBody, ResolverSettings};
pub use types::{
    ApiError, ChatAnswer, EngineEvent, FailureKind, HealthStatus, UploadFile, UploadReceipt,
};
