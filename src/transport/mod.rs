// Transport layer for the upstream telemetry APIs

pub mod upstream;

pub use upstream::{category_url, UpstreamClient};
