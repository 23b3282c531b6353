// Upstream source types and their payload shapes
// The statistics API answers with nested category maps of integers, the
// monitoring API with a flat map of unit-suffixed strings

use std::collections::HashMap;
use std::fmt;

use crate::errors::ExporterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Statistics,
    Monitoring,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Statistics => "statistics",
            SourceKind::Monitoring => "monitoring",
        }
    }

    /// Path segments between the host and the category name.
    pub fn base_path(&self) -> &'static [&'static str] {
        match self {
            SourceKind::Statistics => &["nnfcm-statistics", "v2", "stats"],
            SourceKind::Monitoring => &["nnfcm-monitoring", "v2"],
        }
    }

    /// Decode a response body into the shape this source is expected to
    /// return. `url` only tags the error.
    pub fn decode(&self, url: &str, body: &[u8]) -> Result<Payload, ExporterError> {
        let decoded = match self {
            SourceKind::Statistics => {
                serde_json::from_slice::<StatisticsPayload>(body).map(Payload::Statistics)
            }
            SourceKind::Monitoring => {
                serde_json::from_slice::<MonitoringPayload>(body).map(Payload::Monitoring)
            }
        };
        decoded.map_err(|e| ExporterError::Decode {
            url: url.to_string(),
            kind: *self,
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{ "<jsonCategory>": { "<metric>": <int> } }`
pub type StatisticsPayload = HashMap<String, HashMap<String, i64>>;

/// `{ "<metric>": "<number> [unit]" }`
pub type MonitoringPayload = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Statistics(StatisticsPayload),
    Monitoring(MonitoringPayload),
}
