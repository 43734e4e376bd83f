//! # HTTP API for Cover Pages
//!
//! Exposes the template registry, color resolution, document validation and
//! merge resolution over JSON.
//!
//! ## Usage
//!
//! ```bash
//! COVERPAGE_SIGNING_URL=https://storage.internal/sign coverpage serve --listen 0.0.0.0:8080
//! ```
//!
//! | Method | Path | |
//! |--------|------|-|
//! | GET  | `/healthz` | liveness |
//! | GET  | `/api/templates` | template list |
//! | POST | `/api/templates/:id/instantiate` | fresh document, optionally recolored |
//! | POST | `/api/colors/resolve` | color precedence |
//! | POST | `/api/documents/validate` | decode check |
//! | POST | `/api/render` | resolve a document against a context |

mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::CoverError;

/// Build the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health))
        // Templates
        .route("/api/templates", get(handlers::templates::list))
        .route(
            "/api/templates/:id/instantiate",
            post(handlers::templates::instantiate),
        )
        // Colors
        .route("/api/colors/resolve", post(handlers::colors::resolve))
        // Documents
        .route(
            "/api/documents/validate",
            post(handlers::documents::validate),
        )
        .route("/api/render", post(handlers::documents::render))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use coverpage::config::ServerConfig;
///
/// # async fn example() -> Result<(), coverpage::CoverError> {
/// coverpage::server::serve(ServerConfig::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), CoverError> {
    let listen_addr = config.listen_addr;
    let signing = config.signing.endpoint.clone();
    let app = router(Arc::new(AppState::new(config)?));

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .map_err(|e| CoverError::Transport(format!("Failed to bind to {}: {}", listen_addr, e)))?;

    tracing::info!(
        addr = %listen_addr,
        signing = signing.as_deref().unwrap_or("disabled"),
        "coverpage server listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| CoverError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolutionError;
    use crate::merge::{AssetRef, AssetResolver};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct PrefixSigner;

    #[async_trait]
    impl AssetResolver for PrefixSigner {
        async fn sign(&self, asset: &AssetRef) -> Result<String, ResolutionError> {
            if asset.path.starts_with("missing") {
                return Err(ResolutionError::new(&asset.raw, "not found"));
            }
            Ok(format!("https://signed.test/{}/{}?sig=abc", asset.bucket, asset.path))
        }
    }

    fn app() -> Router {
        router(Arc::new(AppState::with_signer(
            ServerConfig::default(),
            Arc::new(PrefixSigner),
        )))
    }

    async fn call(method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ));
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call("GET", "/healthz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_templates() {
        let (status, body) = call("GET", "/api/templates", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["classic", "centered", "modern", "minimal"]);
        assert_eq!(body[1]["colors"]["primary"], "220 87% 56%");
    }

    #[tokio::test]
    async fn test_instantiate_with_custom_colors() {
        let (status, body) = call(
            "POST",
            "/api/templates/minimal/instantiate",
            Some(json!({ "colorScheme": "custom", "customColors": { "primary": "0 0% 0%" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], 1);
        let title = body["children"]
            .as_array()
            .unwrap()
            .iter()
            .find(|n| n["id"] == "title")
            .unwrap();
        assert_eq!(title["attributes"]["fill"], "hsl(0 0% 0%)");
    }

    #[tokio::test]
    async fn test_instantiate_unknown_template() {
        let (status, _) = call("POST", "/api/templates/baroque/instantiate", Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_resolve_colors() {
        let (status, body) = call(
            "POST",
            "/api/colors/resolve",
            Some(json!({ "colorScheme": "custom", "customColors": { "primary": "0 0% 0%" }, "template": "classic" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["resolved"],
            json!({ "primary": "0 0% 0%", "secondary": "220 70% 40%", "accent": "220 90% 70%" })
        );

        let (_, body) = call("POST", "/api/colors/resolve", Some(json!({ "template": "classic" }))).await;
        assert_eq!(body["resolved"], Value::Null);
        assert_eq!(body["effective"]["primary"], "215 50% 23%");

        let (status, _) = call("POST", "/api/colors/resolve", Some(json!({ "template": "nope" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_validate() {
        let doc = json!({ "version": 1, "id": "root", "kind": "group", "children": [
            { "id": "a", "kind": "text", "attributes": { "text": "hi" } }
        ]});
        let (status, body) = call("POST", "/api/documents/validate", Some(doc)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "valid": true, "nodes": 2 }));

        let bad = json!({ "id": "root", "kind": "group", "children": [
            { "id": "a", "kind": "text", "children": [{ "id": "b", "kind": "rect" }] }
        ]});
        let (_, body) = call("POST", "/api/documents/validate", Some(bad)).await;
        assert_eq!(body["valid"], false);
        assert!(body["error"].as_str().unwrap().contains("/children/0"));
    }

    fn render_body(cover: &str, policy: &str) -> Value {
        json!({
            "document": { "id": "root", "kind": "group", "children": [
                { "id": "title", "kind": "text", "attributes": { "text": "{{report.title}}" } },
                { "id": "cover", "kind": "image", "attributes": {
                    "src": "", "mergeField": "report.coverImage", "strokeDashArray": [8, 6]
                } }
            ]},
            "context": { "report": { "title": "Roof Report", "coverImage": cover } },
            "assetErrorPolicy": policy
        })
    }

    #[tokio::test]
    async fn test_render() {
        let (status, body) =
            call("POST", "/api/render", Some(render_body("storage://r/cover.jpg", "degrade"))).await;
        assert_eq!(status, StatusCode::OK);
        let children = body["document"]["children"].as_array().unwrap();
        assert_eq!(children[0]["attributes"]["text"], "Roof Report");
        assert_eq!(
            children[1]["attributes"],
            json!({ "src": "https://signed.test/r/cover.jpg?sig=abc", "mergeField": "report.coverImage" })
        );
        assert_eq!(body["failures"], json!([]));
    }

    #[tokio::test]
    async fn test_render_degrades_and_aborts() {
        let (status, body) =
            call("POST", "/api/render", Some(render_body("storage://r/missing.jpg", "degrade"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["failures"][0]["nodeId"], "cover");

        let (status, _) =
            call("POST", "/api/render", Some(render_body("storage://r/missing.jpg", "abort"))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_render_rejects_malformed_document() {
        let body = json!({ "document": { "id": "root", "kind": "hexagon" } });
        let (status, _) = call("POST", "/api/render", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
