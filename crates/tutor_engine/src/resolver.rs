//! Endpoint resolution with a single re-resolve-and-retry on failure.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use reqwest::multipart::{Form, Part};
use reqwest::Method;

use crate::candidates::CandidateGenerator;
use crate::probe::{HttpProber, Prober};
use crate::types::map_reqwest_error;
use crate::{ApiError, FailureKind, UploadFile};

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub connect_timeout: Duration,
    /// Bound on each health probe.
    pub probe_timeout: Duration,
    /// Bound on real API calls; inference can be slow.
    pub request_timeout: Duration,
    /// How many times a failed call re-resolves and retries. Zero disables retry.
    pub reresolve_attempts: u32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            probe_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(30),
            reresolve_attempts: 1,
        }
    }
}

/// A request that can be rebuilt for every attempt.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, starting with `/`.
    pub path: String,
    pub body: RequestBody,
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart { field: String, file: UploadFile },
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn post_json(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: RequestBody::Json(body),
        }
    }

    pub fn post_file(path: impl Into<String>, field: impl Into<String>, file: UploadFile) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: RequestBody::Multipart {
                field: field.into(),
                file,
            },
        }
    }

    fn build(
        &self,
        client: &reqwest::Client,
        base_url: &str,
        timeout: Duration,
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let url = format!("{base_url}{}", self.path);
        let builder = client.request(self.method.clone(), url).timeout(timeout);
        let builder = match &self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart { field, file } => {
                let part = Part::bytes(file.bytes.clone())
                    .file_name(file.filename.clone())
                    .mime_str(&file.mime)
                    .map_err(|err| {
                        ApiError::new(
                            FailureKind::UnsupportedFileType {
                                mime: file.mime.clone(),
                            },
                            err.to_string(),
                        )
                    })?;
                builder.multipart(Form::new().part(field.clone(), part))
            }
        };
        Ok(builder)
    }
}

/// Snapshot of what the resolver knows, for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub origin: Option<String>,
    pub endpoint: Option<String>,
    pub attempted: Vec<String>,
}

#[derive(Debug, Default)]
struct ResolverState {
    current: Option<String>,
    attempted: Vec<String>,
    /// Completed sweeps, successful or not.
    sweeps: u64,
}

/// Discovers a reachable backend base URL and routes calls through it.
///
/// The resolved endpoint lives only in memory. The state lock is never held
/// across an await; `sweep` serializes resolutions so callers that need an
/// endpoint at the same time share one sweep.
pub struct EndpointResolver {
    client: reqwest::Client,
    generator: Arc<dyn CandidateGenerator>,
    prober: Arc<dyn Prober>,
    settings: ResolverSettings,
    state: Mutex<ResolverState>,
    sweep: tokio::sync::Mutex<()>,
}

impl EndpointResolver {
    pub fn new(
        client: reqwest::Client,
        settings: ResolverSettings,
        generator: Arc<dyn CandidateGenerator>,
        prober: Arc<dyn Prober>,
    ) -> Self {
        Self {
            client,
            generator,
            prober,
            settings,
            state: Mutex::new(ResolverState::default()),
            sweep: tokio::sync::Mutex::new(()),
        }
    }

    /// Resolver that probes over HTTP with a shared client.
    pub fn http(
        settings: ResolverSettings,
        generator: Arc<dyn CandidateGenerator>,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        let prober = Arc::new(HttpProber::new(client.clone()));
        Ok(Self::new(client, settings, generator, prober))
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Probes every candidate in order and remembers the first that answers.
    pub async fn resolve(&self) -> Option<String> {
        let _sweep = self.sweep.lock().await;
        self.sweep_candidates().await.0
    }

    /// Resolves again unless a sweep completed since `seen`, in which case
    /// that sweep's result is reused. Returns the endpoint with the sweep count
    /// it belongs to.
    async fn resolve_after(&self, seen: u64) -> (Option<String>, u64) {
        let _sweep = self.sweep.lock().await;
        {
            let state = self.state();
            if state.sweeps != seen {
                return (state.current.clone(), state.sweeps);
            }
        }
        self.sweep_candidates().await
    }

    async fn sweep_candidates(&self) -> (Option<String>, u64) {
        let candidates = self.generator.candidates();
        engine_info!("Resolving backend among {} candidates", candidates.len());
        {
            let mut state = self.state();
            state.current = None;
            state.attempted = candidates.clone();
        }

        for candidate in candidates {
            if self
                .prober
                .probe(&candidate, self.settings.probe_timeout)
                .await
            {
                engine_info!("Backend resolved: {}", candidate);
                let mut state = self.state();
                state.current = Some(candidate.clone());
                state.sweeps += 1;
                return (Some(candidate), state.sweeps);
            }
        }

        let mut state = self.state();
        state.sweeps += 1;
        engine_warn!("No backend answered; tried {:?}", state.attempted);
        (None, state.sweeps)
    }

    pub fn current(&self) -> Option<String> {
        self.state().current.clone()
    }

    /// Drops the resolved endpoint so the next call resolves again.
    pub fn forget(&self) {
        self.state().current = None;
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        let state = self.state();
        ConnectionInfo {
            origin: self.generator.origin(),
            endpoint: state.current.clone(),
            attempted: state.attempted.clone(),
        }
    }

    /// Sends `request` to the resolved endpoint, resolving first if needed.
    ///
    /// A failed call (non-2xx, network error, timeout) triggers a new
    /// resolution and one retry, up to `reresolve_attempts` times.
    pub async fn request(&self, request: &ApiRequest) -> Result<reqwest::Response, ApiError> {
        let (current, mut seen) = {
            let state = self.state();
            (state.current.clone(), state.sweeps)
        };
        let mut endpoint = match current {
            Some(endpoint) => endpoint,
            None => match self.resolve_after(seen).await {
                (Some(endpoint), sweeps) => {
                    seen = sweeps;
                    endpoint
                }
                (None, _) => return Err(self.unreachable(None)),
            },
        };

        let mut last_err = match self.send(&endpoint, request).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        for _ in 0..self.settings.reresolve_attempts {
            if !last_err.is_endpoint_failure() {
                break;
            }
            engine_warn!(
                "{} {} via {} failed: {}; re-resolving",
                request.method,
                request.path,
                endpoint,
                last_err
            );
            endpoint = match self.resolve_after(seen).await {
                (Some(endpoint), sweeps) => {
                    seen = sweeps;
                    endpoint
                }
                (None, _) => return Err(self.unreachable(Some(&last_err))),
            };
            match self.send(&endpoint, request).await {
                Ok(response) => return Ok(response),
                Err(err) => last_err = err,
            }
        }

        Err(last_err.with_attempted(self.state().attempted.clone()))
    }

    async fn send(
        &self,
        endpoint: &str,
        request: &ApiRequest,
    ) -> Result<reqwest::Response, ApiError> {
        let response = request
            .build(&self.client, endpoint, self.settings.request_timeout)?
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::new(
            FailureKind::HttpStatus(status.as_u16()),
            format!("backend error: {} - {}", status.as_u16(), body.trim()),
        ))
    }

    fn unreachable(&self, last_err: Option<&ApiError>) -> ApiError {
        let attempted = self.state().attempted.clone();
        let origin = self
            .generator
            .origin()
            .unwrap_or_else(|| "unknown".to_string());
        let mut message = format!(
            "could not connect to the backend.\n\n\
             Possible fixes:\n\
             1. make sure the backend server is running\n\
             2. start it on all interfaces, e.g. `python -m uvicorn app.main:app --host 0.0.0.0 --port 8000`\n\
             3. check that the backend port is open in the firewall\n\n\
             Client origin: {origin}\n\
             Tried: {}",
            attempted.join(", ")
        );
        if let Some(err) = last_err {
            message.push_str(&format!("\nLast error: {err}"));
        }
        ApiError::new(FailureKind::Unreachable, message).with_attempted(attempted)
    }

    fn state(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
