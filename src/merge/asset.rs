//! Internal asset references and the signing collaborator.
//!
//! An internal reference looks like `storage://<bucket>/<path>`. It is only
//! readable inside the platform; rendering needs a time-limited signed URL
//! instead. Absolute `http(s)://` and `data:` values are already usable and
//! are never sent for signing.

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::{DEFAULT_INTERNAL_PREFIX, SigningConfig};
use crate::error::{CoverError, ResolutionError};

/// A parsed internal storage reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub bucket: String,
    pub path: String,
    /// The reference as it appeared in the document.
    pub raw: String,
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Recognizes internal references by prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLocator {
    prefixes: Vec<String>,
}

impl Default for AssetLocator {
    fn default() -> Self {
        Self::new(vec![DEFAULT_INTERNAL_PREFIX.to_string()])
    }
}

impl AssetLocator {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    pub fn from_config(config: &SigningConfig) -> Self {
        Self::new(config.internal_prefixes.clone())
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// `None` when `value` is not internal (pass-through). `Some(Err)` when
    /// it carries an internal prefix but no `bucket/path`.
    pub fn internal_ref(&self, value: &str) -> Option<Result<AssetRef, ResolutionError>> {
        let value = value.trim();
        let rest = self
            .prefixes
            .iter()
            .find_map(|prefix| value.strip_prefix(prefix.as_str()))?;

        let parsed = match rest.trim_start_matches('/').split_once('/') {
            Some((bucket, path)) if !bucket.is_empty() && !path.is_empty() => Ok(AssetRef {
                bucket: bucket.to_string(),
                path: path.to_string(),
                raw: value.to_string(),
            }),
            _ => Err(ResolutionError::new(value, "expected <bucket>/<path>")),
        };
        Some(parsed)
    }
}

/// Attribute keys that carry asset locations: `src`, `backgroundSrc`, ...
pub fn is_src_key(key: &str) -> bool {
    key == crate::document::SRC_KEY || key.ends_with("Src")
}

/// Absolute `http(s)://` or `data:` value, usable as is.
pub fn is_external_url(value: &str) -> bool {
    let value = value.trim_start();
    ["http://", "https://", "data:"].iter().any(|scheme| {
        value
            .get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
    })
}

/// Exchanges internal references for externally fetchable URLs.
///
/// Implementations own their timeouts; the resolver waits as long as
/// `sign` does.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    async fn sign(&self, asset: &AssetRef) -> Result<String, ResolutionError>;
}

/// Resolver used when no signing service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSigner;

#[async_trait]
impl AssetResolver for NoSigner {
    async fn sign(&self, asset: &AssetRef) -> Result<String, ResolutionError> {
        Err(ResolutionError::new(&asset.raw, "no signing service configured"))
    }
}

// ============================================================================
// HTTP SIGNER
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest<'a> {
    bucket: &'a str,
    path: &'a str,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignResponse {
    signed_url: String,
}

/// Signs references through an HTTP endpoint.
///
/// Sends `POST {endpoint}` with `{bucket, path, expiresIn}` and expects
/// `{signedUrl}` back. A relative `signedUrl` is joined onto the endpoint.
#[derive(Debug, Clone)]
pub struct HttpSigner {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
    expires_in: Duration,
}

impl HttpSigner {
    pub fn new(config: &SigningConfig) -> Result<Self, CoverError> {
        let Some(endpoint) = config.endpoint.as_deref() else {
            return Err(CoverError::Config("signing endpoint is not set".into()));
        };
        let endpoint = Url::parse(endpoint)
            .map_err(|e| CoverError::Config(format!("invalid signing endpoint {}: {}", endpoint, e)))?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("coverpage/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| CoverError::Config(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            expires_in: config.expires_in,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl AssetResolver for HttpSigner {
    async fn sign(&self, asset: &AssetRef) -> Result<String, ResolutionError> {
        let fail = |message: String| ResolutionError::new(&asset.raw, message);

        let mut request = self.client.post(self.endpoint.clone()).json(&SignRequest {
            bucket: &asset.bucket,
            path: &asset.path,
            expires_in: self.expires_in.as_secs(),
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| fail(format!("signing request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("signing service returned {}", status)));
        }

        let body: SignResponse = response
            .json()
            .await
            .map_err(|e| fail(format!("invalid signing response: {}", e)))?;

        let url = self
            .endpoint
            .join(&body.signed_url)
            .map_err(|e| fail(format!("invalid signed URL {}: {}", body.signed_url, e)))?;

        tracing::debug!(asset = %asset, "signed asset");
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    #[test]
    fn test_external_urls() {
        assert!(is_external_url("https://cdn.example.com/a.png"));
        assert!(is_external_url("HTTP://cdn.example.com/a.png"));
        assert!(is_external_url("data:image/png;base64,AAAA"));
        assert!(!is_external_url("storage://reports/a.png"));
        assert!(!is_external_url(""));
        assert!(!is_external_url("/relative/a.png"));
    }

    #[test]
    fn test_internal_ref_parsed() {
        let locator = AssetLocator::default();
        let asset = locator
            .internal_ref("storage://reports/r1/cover.jpg")
            .unwrap()
            .unwrap();
        assert_eq!(asset.bucket, "reports");
        assert_eq!(asset.path, "r1/cover.jpg");
        assert_eq!(asset.to_string(), "storage://reports/r1/cover.jpg");
    }

    #[test]
    fn test_external_urls_pass_through() {
        let locator = AssetLocator::default();
        assert!(locator.internal_ref("https://cdn.example.com/a.png").is_none());
        assert!(locator.internal_ref("data:image/png;base64,AAAA").is_none());
        assert!(locator.internal_ref("").is_none());
    }

    #[test]
    fn test_malformed_internal_ref() {
        let locator = AssetLocator::default();
        assert!(locator.internal_ref("storage://reports").unwrap().is_err());
        assert!(locator.internal_ref("storage://").unwrap().is_err());
    }

    #[test]
    fn test_custom_prefixes() {
        let locator = AssetLocator::new(vec!["s3://".into(), "storage://".into()]);
        let asset = locator.internal_ref("s3://media/logo.png").unwrap().unwrap();
        assert_eq!(asset.bucket, "media");
    }

    #[test]
    fn test_src_keys() {
        assert!(is_src_key("src"));
        assert!(is_src_key("backgroundSrc"));
        assert!(!is_src_key("source"));
        assert!(!is_src_key("srcset"));
    }

    #[test]
    fn test_http_signer_requires_endpoint() {
        assert!(matches!(
            HttpSigner::new(&SigningConfig::default()),
            Err(CoverError::Config(_))
        ));
    }

    async fn spawn_signing_service() -> String {
        async fn sign(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
            if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer secret") {
                return (StatusCode::UNAUTHORIZED, Json(json!({})));
            }
            let url = format!(
                "/signed/{}/{}?ttl={}",
                body["bucket"].as_str().unwrap_or_default(),
                body["path"].as_str().unwrap_or_default(),
                body["expiresIn"]
            );
            (StatusCode::OK, Json(json!({ "signedUrl": url })))
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/sign", post(sign));
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{}/sign", addr)
    }

    #[tokio::test]
    async fn test_http_signer_round_trip() {
        let endpoint = spawn_signing_service().await;
        let signer = HttpSigner::new(&SigningConfig {
            endpoint: Some(endpoint.clone()),
            api_key: Some("secret".into()),
            expires_in: Duration::from_secs(600),
            ..Default::default()
        })
        .unwrap();

        let asset = AssetLocator::default()
            .internal_ref("storage://reports/r1/cover.jpg")
            .unwrap()
            .unwrap();
        let url = signer.sign(&asset).await.unwrap();
        let base = endpoint.trim_end_matches("/sign");
        assert_eq!(url, format!("{}/signed/reports/r1/cover.jpg?ttl=600", base));
    }

    #[tokio::test]
    async fn test_http_signer_rejected() {
        let endpoint = spawn_signing_service().await;
        let signer = HttpSigner::new(&SigningConfig {
            endpoint: Some(endpoint),
            ..Default::default()
        })
        .unwrap();

        let asset = AssetRef {
            bucket: "b".into(),
            path: "p.png".into(),
            raw: "storage://b/p.png".into(),
        };
        let err = signer.sign(&asset).await.unwrap_err();
        assert_eq!(err.reference, "storage://b/p.png");
        assert!(err.message.contains("401"), "{}", err.message);
    }

    #[tokio::test]
    async fn test_no_signer_fails() {
        let asset = AssetRef {
            bucket: "b".into(),
            path: "p.png".into(),
            raw: "storage://b/p.png".into(),
        };
        assert!(NoSigner.sign(&asset).await.is_err());
    }
}
