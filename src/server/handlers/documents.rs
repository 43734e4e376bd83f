//! Document validation and rendering handlers.

use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::{ApiError, api_error};
use crate::document::codec;
use crate::merge::{AssetErrorPolicy, AssetFailure, MergeResolver, ResolutionContext};
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/documents/validate - Check a canonical document.
///
/// Always 200; the verdict is in the body.
pub async fn validate(body: Bytes) -> Json<ValidateResponse> {
    Json(match codec::decode(&body) {
        Ok(doc) => ValidateResponse {
            valid: true,
            nodes: Some(doc.node_count()),
            error: None,
        },
        Err(e) => ValidateResponse {
            valid: false,
            nodes: None,
            error: Some(e.to_string()),
        },
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub document: Value,
    #[serde(default)]
    pub context: ResolutionContext,
    #[serde(default)]
    pub asset_error_policy: AssetErrorPolicy,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub document: Value,
    pub failures: Vec<AssetFailure>,
}

/// POST /api/render - Resolve a document against a context.
pub async fn render(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, ApiError> {
    let doc = codec::decode_value(req.document).map_err(api_error)?;

    let resolved = MergeResolver::new(&req.context, state.signer.as_ref())
        .with_locator(state.locator.clone())
        .with_policy(req.asset_error_policy)
        .resolve(&doc)
        .await
        .map_err(api_error)?;

    Ok(Json(RenderResponse {
        document: codec::encode_value(&resolved.document),
        failures: resolved.failures,
    }))
}
