// Router module - HTTP surface of the exporter
// This file wires the scrape endpoint to the shared exporter state

#[allow(clippy::module_inception)]
pub mod router;

pub use router::{create_exporter_router, Exporter};
