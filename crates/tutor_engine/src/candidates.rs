//! Candidate backend base URLs.
//!
//! The resolver asks a [`CandidateGenerator`] for an ordered list of base URLs
//! and probes them in that order. The default generator guesses from the
//! client's own origin host; a configured URL list can replace it without
//! touching the resolver.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use engine_logging::engine_debug;

pub const DEFAULT_BACKEND_PORT: u16 = 8000;

const LOOPBACK_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "::1"];

pub trait CandidateGenerator: Send + Sync {
    /// Ordered, duplicate-free base URLs (`scheme://host:port`, no trailing slash).
    fn candidates(&self) -> Vec<String>;

    /// Host the candidates were derived from, for diagnostics.
    fn origin(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    /// Host (or full origin URL) the client itself is served from.
    pub origin_host: Option<String>,
    pub port: u16,
    /// IPv4 origins starting with one of these get their subnet siblings probed.
    pub private_prefixes: Vec<String>,
    /// Last-octet range tried for subnet siblings.
    pub sibling_first: u8,
    pub sibling_last: u8,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            origin_host: None,
            port: DEFAULT_BACKEND_PORT,
            private_prefixes: vec![
                "172.".to_string(),
                "192.168.".to_string(),
                "10.".to_string(),
            ],
            sibling_first: 1,
            sibling_last: 10,
        }
    }
}

/// Same host as the client, then loopback, then neighbours on a private subnet.
#[derive(Debug, Clone, Default)]
pub struct SubnetScanCandidates {
    settings: DiscoverySettings,
}

impl SubnetScanCandidates {
    pub fn new(settings: DiscoverySettings) -> Self {
        Self { settings }
    }

    fn origin_host(&self) -> Option<String> {
        let raw = self.settings.origin_host.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        host_of(raw)
    }

    /// The origin as an address, when it is a literal IPv4 on a private subnet.
    fn private_ipv4(&self, host: &str) -> Option<Ipv4Addr> {
        let addr: Ipv4Addr = host.parse().ok()?;
        let dotted = addr.to_string();
        self.settings
            .private_prefixes
            .iter()
            .any(|prefix| dotted.starts_with(prefix.as_str()))
            .then_some(addr)
    }
}

impl CandidateGenerator for SubnetScanCandidates {
    fn candidates(&self) -> Vec<String> {
        let port = self.settings.port;
        let origin = self
            .origin_host()
            .filter(|host| !LOOPBACK_HOSTS.contains(&host.as_str()));

        let mut urls = Vec::new();
        if let Some(host) = origin.as_deref() {
            urls.push(base_url(host, port));
        }
        urls.push(base_url("localhost", port));
        urls.push(base_url("127.0.0.1", port));

        if let Some(addr) = origin.as_deref().and_then(|host| self.private_ipv4(host)) {
            let [a, b, c, _] = addr.octets();
            for octet in self.settings.sibling_first..=self.settings.sibling_last {
                let sibling = Ipv4Addr::new(a, b, c, octet);
                urls.push(base_url(&sibling.to_string(), port));
            }
        }

        let urls = dedupe(urls);
        engine_debug!("Candidate backend URLs: {:?}", urls);
        urls
    }

    fn origin(&self) -> Option<String> {
        self.origin_host()
    }
}

/// A fixed list, typically from configuration.
#[derive(Debug, Clone)]
pub struct StaticCandidates {
    urls: Vec<String>,
}

impl StaticCandidates {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls = urls
            .into_iter()
            .map(|url| url.into().trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .collect();
        Self { urls: dedupe(urls) }
    }
}

impl CandidateGenerator for StaticCandidates {
    fn candidates(&self) -> Vec<String> {
        self.urls.clone()
    }
}

/// IPv6 literals are bracketed so the port stays separable.
fn base_url(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("http://[{host}]:{port}")
    } else {
        format!("http://{host}:{port}")
    }
}

/// Accepts either a bare host name or a full origin such as `http://10.0.0.5:3000`.
/// IPv6 hosts come back without brackets.
fn host_of(raw: &str) -> Option<String> {
    let host = if raw.contains("://") {
        url::Url::parse(raw).ok()?.host_str()?.to_string()
    } else if let Some(rest) = raw.strip_prefix('[') {
        rest.split_once(']').map_or(rest, |(host, _)| host).to_string()
    } else {
        let host = match raw.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') && port.parse::<u16>().is_ok() => host,
            _ => raw,
        };
        host.to_string()
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

fn dedupe(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_of_handles_origins_and_ports() {
        assert_eq!(host_of("http://172.29.213.100:3000/"), Some("172.29.213.100".into()));
        assert_eq!(host_of("Tutor.Local:5173"), Some("tutor.local".into()));
        assert_eq!(host_of("::1"), Some("::1".into()));
        assert_eq!(host_of("[fe80::1]:3000"), Some("fe80::1".into()));
        assert_eq!(host_of("http://[::1]:3000"), Some("::1".into()));
        assert_eq!(host_of("http://"), None);
    }

    #[test]
    fn static_candidates_normalize_and_dedupe() {
        let gen = StaticCandidates::new(["http://a:1/", " http://a:1", "", "http://b:2"]);
        assert_eq!(gen.candidates(), vec!["http://a:1", "http://b:2"]);
    }

    #[test]
    fn base_url_brackets_ipv6() {
        assert_eq!(base_url("fe80::1", 8000), "http://[fe80::1]:8000");
        assert_eq!(base_url("10.0.0.1", 8000), "http://10.0.0.1:8000");
    }
}
