//! Mapping rendered mock content onto HTTP responses.
//!
//! # Design Decisions
//! - Content type comes from the pipeline; an unrepresentable value falls back to `text/plain`
//! - Render faults become `500` with the fault message as a plain-text body

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::response::{ResponseError, ResponsePipeline, DEFAULT_CONTENT_TYPE};

/// Successful mock response.
pub fn mock_response(pipeline: &ResponsePipeline, body: Bytes) -> Response {
    let content_type = HeaderValue::from_str(pipeline.content_type()).unwrap_or_else(|_| {
        tracing::warn!(
            response_id = %pipeline.id(),
            content_type = %pipeline.content_type(),
            "Invalid content type, using default"
        );
        HeaderValue::from_static(DEFAULT_CONTENT_TYPE)
    });
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}

/// Response for a render that failed.
pub fn render_failure(error: &ResponseError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE))],
        error.to_string(),
    )
        .into_response()
}
