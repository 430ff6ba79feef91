use std::collections::HashSet;
use std::net::IpAddr;

use ipnet::IpNet;

use crate::error::{SecurityError, SecurityResult};

/// URL validator for SSRF protection.
///
/// Rejects:
/// - Non-HTTP(S) schemes (file://, ftp://, data:)
/// - Loopback and well-known metadata hostnames
/// - Private, loopback and link-local IP ranges, including hostnames that
///   resolve into them
#[derive(Debug, Clone)]
pub struct UrlValidator {
    allowed_schemes: HashSet<String>,
    blocked_hosts: HashSet<String>,
    blocked_cidrs: Vec<IpNet>,
    /// Hosts that skip every other check
    allowed_hosts: HashSet<String>,
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

const BLOCKED_HOSTS: &[&str] = &[
    "localhost",
    "0.0.0.0",
    "metadata.google.internal",
    "metadata.gke.internal",
    "instance-data",
];

const BLOCKED_CIDRS: &[&str] = &[
    "0.0.0.0/8",
    "10.0.0.0/8",
    "100.64.0.0/10",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "::1/128",
    "fc00::/7",
    "fe80::/10",
];

impl UrlValidator {
    /// Create a validator with the default block lists.
    pub fn new() -> Self {
        Self {
            allowed_schemes: ["http", "https"].into_iter().map(String::from).collect(),
            blocked_hosts: BLOCKED_HOSTS.iter().map(|h| h.to_string()).collect(),
            blocked_cidrs: BLOCKED_CIDRS.iter().filter_map(|c| c.parse().ok()).collect(),
            allowed_hosts: HashSet::new(),
        }
    }

    /// Add an allowed host (bypasses validation).
    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.insert(host.into().to_lowercase());
        self
    }

    /// Block an additional host.
    pub fn block_host(mut self, host: impl Into<String>) -> Self {
        self.blocked_hosts.insert(host.into().to_lowercase());
        self
    }

    /// Block an additional CIDR range.
    pub fn block_cidr(mut self, cidr: IpNet) -> Self {
        self.blocked_cidrs.push(cidr);
        self
    }

    fn blocked_ip(&self, ip: IpAddr) -> bool {
        let ip = match ip {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
            v4 => v4,
        };
        self.blocked_cidrs.iter().any(|cidr| cidr.contains(&ip))
    }

    /// Validate a URL without touching the network.
    pub fn validate(&self, url: &str) -> SecurityResult<()> {
        let parsed = url::Url::parse(url)?;

        if !self.allowed_schemes.contains(parsed.scheme()) {
            return Err(SecurityError::DisallowedScheme(parsed.scheme().to_string()));
        }

        let host = parsed.host_str().ok_or(SecurityError::NoHost)?;
        if self.allowed_hosts.contains(host) {
            return Ok(());
        }
        if self.blocked_hosts.contains(host) {
            return Err(SecurityError::BlockedHost(host.to_string()));
        }

        // IPv6 literals come back bracketed from host_str
        let bare = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            if self.blocked_ip(ip) {
                return Err(SecurityError::BlockedCidr(ip.to_string()));
            }
        }

        Ok(())
    }

    /// Validate a URL and resolve DNS to check the actual IPs.
    ///
    /// Catches hostnames that point at internal addresses.
    pub async fn validate_with_dns(&self, url: &str) -> SecurityResult<()> {
        self.validate(url)?;

        let parsed = url::Url::parse(url)?;
        let host = parsed.host_str().ok_or(SecurityError::NoHost)?;

        if self.allowed_hosts.contains(host) {
            return Ok(());
        }
        if host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok()
        {
            return Ok(());
        }

        let port = parsed.port_or_known_default().unwrap_or(80);
        let addrs = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| SecurityError::DnsResolution(e.to_string()))?;

        for addr in addrs {
            if self.blocked_ip(addr.ip()) {
                return Err(SecurityError::BlockedCidr(format!(
                    "DNS for {} resolved to blocked IP {}",
                    host,
                    addr.ip()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_loopback() {
        let validator = UrlValidator::new();
        assert!(validator.validate("http://localhost/").is_err());
        assert!(validator.validate("http://127.0.0.1/").is_err());
        assert!(validator.validate("http://[::1]/").is_err());
        assert!(validator.validate("http://[::ffff:127.0.0.1]/").is_err());
    }

    #[test]
    fn test_blocks_private_and_metadata() {
        let validator = UrlValidator::new();
        assert!(validator.validate("http://10.0.0.1/").is_err());
        assert!(validator.validate("http://172.16.0.1/").is_err());
        assert!(validator.validate("http://192.168.1.1/").is_err());
        assert!(validator.validate("http://169.254.169.254/latest").is_err());
        assert!(validator.validate("http://metadata.google.internal/").is_err());
    }

    #[test]
    fn test_blocks_non_http() {
        let validator = UrlValidator::new();
        assert!(validator.validate("file:///etc/passwd").is_err());
        assert!(validator.validate("ftp://example.com/").is_err());
        assert!(validator.validate("data:image/png;base64,aGk=").is_err());
    }

    #[test]
    fn test_allows_public_urls() {
        let validator = UrlValidator::new();
        assert!(validator.validate("https://events.example/x").is_ok());
        assert!(validator.validate("http://8.8.8.8/").is_ok());
    }

    #[test]
    fn test_allowed_hosts_bypass() {
        let validator = UrlValidator::new().allow_host("localhost");
        assert!(validator.validate("http://localhost/").is_ok());
    }

    #[tokio::test]
    async fn test_dns_check_skipped_for_ip_literals() {
        let validator = UrlValidator::new();
        assert!(validator.validate_with_dns("http://8.8.8.8/").await.is_ok());
        assert!(validator.validate_with_dns("http://10.1.2.3/").await.is_err());
    }
}
