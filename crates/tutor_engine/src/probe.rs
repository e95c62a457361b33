use std::time::Duration;

use engine_logging::{engine_debug, engine_info};

pub const HEALTH_PATH: &str = "/health";

/// Tests whether a backend base URL is reachable.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, base_url: &str, timeout: Duration) -> bool;
}

/// Probes `GET {base_url}/health`; any 2xx counts as alive.
#[derive(Debug, Clone, Default)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn probe(&self, base_url: &str, timeout: Duration) -> bool {
        let url = format!("{base_url}{HEALTH_PATH}");
        match self.client.get(&url).timeout(timeout).send().await {
            Ok(response) if response.status().is_success() => {
                engine_info!("Health probe ok: {}", base_url);
                true
            }
            Ok(response) => {
                engine_debug!("Health probe {} answered {}", base_url, response.status());
                false
            }
            Err(err) => {
                engine_debug!("Health probe {} failed: {}", base_url, err);
                false
            }
        }
    }
}
