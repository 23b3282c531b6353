// Library root module for nnfcm-exporter
// This file defines the public API and module structure of the exporter:
// upstream fetch, normalization, merge and Prometheus publishing

pub mod aggregate;
pub mod coerce;
pub mod config;
pub mod control;
pub mod dataset;
pub mod errors;
pub mod metrics;
pub mod router;
pub mod scrape;
pub mod source;
pub mod transport;
