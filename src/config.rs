//! Runtime configuration for the server and the asset signer.
//!
//! The binary fills these from CLI flags and `COVERPAGE_*` environment
//! variables; library callers construct them directly.

use std::net::SocketAddr;
use std::time::Duration;

/// Default address for `coverpage serve`.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

/// Prefix that marks a `src` value as an internal storage reference.
pub const DEFAULT_INTERNAL_PREFIX: &str = "storage://";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub signing: SigningConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            signing: SigningConfig::default(),
        }
    }
}

/// How internal asset references are exchanged for signed URLs.
#[derive(Debug, Clone, PartialEq)]
pub struct SigningConfig {
    /// Signing service URL. `None` disables signing; internal references
    /// then fail to resolve.
    pub endpoint: Option<String>,
    /// Sent as a bearer token when set.
    pub api_key: Option<String>,
    /// Lifetime requested for each signed URL.
    pub expires_in: Duration,
    /// Per-request timeout for the signing service.
    pub timeout: Duration,
    pub internal_prefixes: Vec<String>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            expires_in: Duration::from_secs(3600),
            timeout: Duration::from_secs(10),
            internal_prefixes: vec![DEFAULT_INTERNAL_PREFIX.to_string()],
        }
    }
}

impl SigningConfig {
    /// Parse a comma-separated prefix list, dropping blanks. Falls back to
    /// the default prefix when nothing remains.
    pub fn parse_prefixes(raw: &str) -> Vec<String> {
        let prefixes: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if prefixes.is_empty() {
            vec![DEFAULT_INTERNAL_PREFIX.to_string()]
        } else {
            prefixes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr.to_string(), DEFAULT_LISTEN);
        assert_eq!(config.signing.expires_in, Duration::from_secs(3600));
        assert_eq!(config.signing.internal_prefixes, vec!["storage://"]);
        assert!(config.signing.endpoint.is_none());
    }

    #[test]
    fn test_parse_prefixes() {
        assert_eq!(
            SigningConfig::parse_prefixes("storage://, s3://,,"),
            vec!["storage://", "s3://"]
        );
        assert_eq!(SigningConfig::parse_prefixes(" , "), vec!["storage://"]);
    }
}
