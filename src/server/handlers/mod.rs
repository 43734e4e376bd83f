//! HTTP handlers for the server.

pub mod colors;
pub mod documents;
pub mod templates;

use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::error::{CoverError, TemplateError};

/// Error half of every handler's result.
pub type ApiError = (StatusCode, String);

/// Status code for a pipeline error.
pub fn status_for(err: &CoverError) -> StatusCode {
    match err {
        CoverError::Template(TemplateError::Broken { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        CoverError::Parse(_) | CoverError::Structural(_) | CoverError::Template(_) => {
            StatusCode::BAD_REQUEST
        }
        CoverError::Resolution(_) => StatusCode::BAD_GATEWAY,
        CoverError::Config(_) | CoverError::Transport(_) | CoverError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub fn api_error(err: impl Into<CoverError>) -> ApiError {
    let err = err.into();
    (status_for(&err), err.to_string())
}

/// GET /healthz
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParseError, ResolutionError, StructuralError};

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&ParseError::new("/", "bad").into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&TemplateError::InvalidTemplate { id: "x".into() }.into()),
            StatusCode::BAD_REQUEST
        );
        let broken = TemplateError::Broken {
            id: "x".into(),
            source: StructuralError::RootImmutable,
        };
        assert_eq!(status_for(&broken.into()), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_for(&ResolutionError::new("storage://a/b", "denied").into()),
            StatusCode::BAD_GATEWAY
        );
    }
}
