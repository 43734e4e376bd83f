//! Color resolution handler.

use axum::Json;
use serde::{Deserialize, Serialize};

use super::{ApiError, api_error};
use crate::error::TemplateError;
use crate::template::{self, ColorScheme, CustomColors};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    #[serde(default)]
    pub color_scheme: Option<String>,
    #[serde(default)]
    pub custom_colors: Option<CustomColors>,
    pub template: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    /// The scheme from precedence rules; `null` when the template decides.
    pub resolved: Option<ColorScheme>,
    /// Colors the document will actually use.
    pub effective: ColorScheme,
}

/// POST /api/colors/resolve
pub async fn resolve(Json(req): Json<ResolveRequest>) -> Result<Json<ResolveResponse>, ApiError> {
    let template = template::by_id(&req.template).ok_or_else(|| {
        api_error(TemplateError::InvalidTemplate {
            id: req.template.clone(),
        })
    })?;

    let resolved =
        template::resolve_colors(req.color_scheme.as_deref(), req.custom_colors.as_ref());
    Ok(Json(ResolveResponse {
        resolved,
        effective: resolved.unwrap_or(template.colors),
    }))
}
