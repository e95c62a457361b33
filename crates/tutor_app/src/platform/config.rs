//! Front-end configuration: an optional `tutor.ron` file, then environment
//! overrides on top.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tutor_engine::{
    CandidateGenerator, DiscoverySettings, ResolverSettings, StaticCandidates,
    SubnetScanCandidates, DEFAULT_BACKEND_PORT,
};

const CONFIG_FILENAME: &str = "tutor.ron";
const DEFAULT_HISTORY_DIR: &str = ".tutor";

const ENV_CONFIG: &str = "TUTOR_CONFIG";
const ENV_BACKEND_URL: &str = "TUTOR_BACKEND_URL";
const ENV_ORIGIN_HOST: &str = "TUTOR_ORIGIN_HOST";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fixed backend base URL(s), comma separated. Disables subnet discovery.
    pub backend_url: Option<String>,
    /// Host this client is reached at; seeds discovery candidates.
    pub origin_host: Option<String>,
    pub port: u16,
    pub probe_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub history_dir: Option<PathBuf>,
    pub log_to_terminal: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let resolver = ResolverSettings::default();
        Self {
            backend_url: None,
            origin_host: None,
            port: DEFAULT_BACKEND_PORT,
            probe_timeout_ms: resolver.probe_timeout.as_millis() as u64,
            request_timeout_ms: resolver.request_timeout.as_millis() as u64,
            history_dir: None,
            log_to_terminal: false,
        }
    }
}

impl AppConfig {
    /// Loads `$TUTOR_CONFIG` (or `./tutor.ron`) and applies environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var_os(ENV_CONFIG)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// A missing file yields the defaults; an unreadable or malformed one is an error.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text)
                .with_context(|| format!("invalid configuration in {}", path.display())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => {
                Err(err).with_context(|| format!("could not read {}", path.display()))
            }
        }
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Non-blank values from `lookup` replace file settings.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        if let Some(url) = value(ENV_BACKEND_URL) {
            self.backend_url = Some(url);
        }
        if let Some(host) = value(ENV_ORIGIN_HOST) {
            self.origin_host = Some(host);
        }
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            ..ResolverSettings::default()
        }
    }

    pub fn candidate_generator(&self) -> Arc<dyn CandidateGenerator> {
        match &self.backend_url {
            Some(urls) => Arc::new(StaticCandidates::new(urls.split(','))),
            None => Arc::new(SubnetScanCandidates::new(DiscoverySettings {
                origin_host: self.origin_host.clone(),
                port: self.port,
                ..DiscoverySettings::default()
            })),
        }
    }

    pub fn history_dir(&self) -> PathBuf {
        match &self.history_dir {
            Some(dir) => dir.clone(),
            None => env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_HISTORY_DIR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::parse("()").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.port, 8000);
        assert_eq!(config.request_timeout_ms, 30_000);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::parse(
            r#"(
                origin_host: Some("172.29.213.100"),
                port: 9000,
                log_to_terminal: true,
            )"#,
        )
        .unwrap();

        assert_eq!(config.origin_host.as_deref(), Some("172.29.213.100"));
        assert_eq!(config.port, 9000);
        assert!(config.log_to_terminal);
        assert_eq!(config.backend_url, None);
        assert_eq!(config.probe_timeout_ms, 3_000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(AppConfig::parse("(port: \"eighty\")").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::from_file(&temp.path().join("tutor.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn file_on_disk_is_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tutor.ron");
        fs::write(&path, "(history_dir: Some(\"/tmp/tutor-history\"))").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.history_dir(), PathBuf::from("/tmp/tutor-history"));
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = AppConfig {
            origin_host: Some("192.168.1.2".to_string()),
            ..AppConfig::default()
        };
        config.apply_overrides(|key| match key {
            "TUTOR_BACKEND_URL" => Some(" http://tutor.lan:8000 ".to_string()),
            "TUTOR_ORIGIN_HOST" => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(config.backend_url.as_deref(), Some("http://tutor.lan:8000"));
        assert_eq!(config.origin_host.as_deref(), Some("192.168.1.2"));
    }

    #[test]
    fn backend_url_disables_discovery() {
        let config = AppConfig {
            backend_url: Some("http://a:8000/, http://b:8000".to_string()),
            origin_host: Some("172.16.0.5".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(
            config.candidate_generator().candidates(),
            vec!["http://a:8000", "http://b:8000"]
        );
    }

    #[test]
    fn discovery_uses_origin_and_port() {
        let config = AppConfig {
            origin_host: Some("172.16.0.5".to_string()),
            port: 8080,
            ..AppConfig::default()
        };
        let candidates = config.candidate_generator().candidates();
        assert_eq!(candidates[0], "http://172.16.0.5:8080");
        assert!(candidates.contains(&"http://localhost:8080".to_string()));
    }

    #[test]
    fn timeouts_flow_into_resolver_settings() {
        let config = AppConfig {
            probe_timeout_ms: 500,
            request_timeout_ms: 60_000,
            ..AppConfig::default()
        };
        let settings = config.resolver_settings();
        assert_eq!(settings.probe_timeout, Duration::from_millis(500));
        assert_eq!(settings.request_timeout, Duration::from_secs(60));
        assert_eq!(settings.reresolve_attempts, 1);
    }
}
