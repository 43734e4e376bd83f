//! Template API handlers.

use axum::{Json, extract::Path, http::StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{ApiError, api_error};
use crate::document::codec;
use crate::template::{self, CustomColors, Template};

/// Body for instantiate and color-resolve requests.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorRequest {
    pub color_scheme: Option<String>,
    pub custom_colors: Option<CustomColors>,
}

/// GET /api/templates - List templates with their styles and colors.
pub async fn list() -> Json<&'static [Template]> {
    Json(template::all())
}

/// POST /api/templates/:id/instantiate - Build a fresh document.
pub async fn instantiate(
    Path(id): Path<String>,
    Json(req): Json<ColorRequest>,
) -> Result<Json<Value>, ApiError> {
    let template = template::by_id(&id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Template '{}' not found", id)))?;

    let scheme = template::resolve_colors(req.color_scheme.as_deref(), req.custom_colors.as_ref());
    let doc = template
        .instantiate_with_colors(scheme.as_ref())
        .map_err(api_error)?;

    tracing::info!(template = template.id, nodes = doc.node_count(), "instantiated template");
    Ok(Json(codec::encode_value(&doc)))
}
