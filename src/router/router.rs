// Exporter HTTP API implementation
// This file provides the /metrics scrape endpoint and the health probe

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router as AxumRouter,
};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::control::ScrapeAdmission;
use crate::errors::ExporterError;
use crate::metrics::{self, CONTENT_TYPE};
use crate::scrape::Scraper;

/// Shared state of the scrape endpoint
pub struct Exporter {
    scraper: Scraper,
    admission: ScrapeAdmission,
}

impl Exporter {
    pub fn new(scraper: Scraper, admission: ScrapeAdmission) -> Self {
        Self { scraper, admission }
    }

    /// Run one full fetch -> normalize -> publish cycle.
    pub async fn render(&self) -> Result<String, ExporterError> {
        let _permit = self.admission.acquire().await;
        let dataset = self.scraper.scrape().await?;
        metrics::publish(&dataset)
    }
}

/// Create the HTTP router with the exporter endpoints
pub fn create_exporter_router(exporter: Arc<Exporter>) -> AxumRouter {
    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/metrics", get(scrape_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(exporter)
}

/// Health check endpoint
async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Scrape endpoint - rebuilds the exposition from the upstreams on every call
async fn scrape_metrics(State(exporter): State<Arc<Exporter>>) -> Response {
    match exporter.render().await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(err) => {
            warn!(error = %err, status = err.status_code().as_u16(), "scrape failed");
            err.into_response()
        }
    }
}
