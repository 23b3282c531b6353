// Metrics publishing module
// This file turns a scrape's combined dataset into Prometheus gauges and
// renders them in the text exposition format
//
// Every call builds its own registry. Metric names follow whatever the
// upstreams report, so the set of live series changes from one scrape to
// the next and nothing may linger from a previous one.

use std::collections::HashMap;

use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use tracing::{debug, warn};

use crate::dataset::Dataset;
use crate::errors::ExporterError;

/// `Content-Type` of the rendered exposition.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Register one gauge per `(category, metric)` in a fresh registry.
///
/// Two triples that produce the same gauge name keep the later value.
pub fn build_registry(dataset: &Dataset) -> Registry {
    let registry = Registry::new();
    let mut gauges: HashMap<String, Gauge> = HashMap::new();

    for (category, metric, value) in dataset.iter() {
        let name = format!("{category}_{metric}");
        if let Some(gauge) = gauges.get(&name) {
            gauge.set(value as f64);
            continue;
        }

        let opts = Opts::new(
            name.clone(),
            format!("Metric {metric} from category {category}"),
        );
        let registered = Gauge::with_opts(opts).and_then(|gauge| {
            registry.register(Box::new(gauge.clone()))?;
            Ok(gauge)
        });
        match registered {
            Ok(gauge) => {
                gauge.set(value as f64);
                gauges.insert(name, gauge);
            }
            Err(err) => warn!(metric = %name, error = %err, "skipping unregistrable metric"),
        }
    }

    debug!(gauges = gauges.len(), "registry rebuilt");
    registry
}

/// Build a registry for `dataset` and encode it.
pub fn publish(dataset: &Dataset) -> Result<String, ExporterError> {
    let registry = build_registry(dataset);
    let families = registry.gather();

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| ExporterError::Registry(prometheus::Error::Msg(e.to_string())))
}
