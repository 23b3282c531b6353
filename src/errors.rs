// Error types and error handling module
// This file defines the exporter error type and how each failure class
// maps onto the HTTP status of a scrape response

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::source::SourceKind;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("failed to build upstream http client: {0}")]
    Client(String),
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("unexpected status code {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("failed to parse {kind} JSON from {url}: {reason}")]
    Decode {
        url: String,
        kind: SourceKind,
        reason: String,
    },
    #[error("cannot convert value '{value}' to a number: {reason}")]
    Coerce { value: String, reason: String },
    #[error("invalid {kind} endpoint {endpoint}: {reason}")]
    Endpoint {
        kind: SourceKind,
        endpoint: String,
        reason: String,
    },
    #[error("aggregation task failed: {0}")]
    Task(String),
    #[error("No valid configuration provided for statistics or monitoring")]
    NoData,
    #[error("failed to render metrics: {0}")]
    Registry(#[from] prometheus::Error),
}

impl ExporterError {
    /// Only a scrape with nothing to report is the caller's problem; every
    /// other escalated error is ours.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExporterError::NoData => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ExporterError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
