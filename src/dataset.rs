// Combined metric dataset
// Normalizes statistics and monitoring payloads into one flat
// category -> metric -> value mapping, built fresh for every scrape

use std::collections::BTreeMap;

use tracing::warn;

use crate::coerce::{coerce_reading, MetricValue};
use crate::source::Payload;

pub type CategoryMetrics = BTreeMap<String, MetricValue>;

/// Qualified category key -> metrics. Colliding values are always summed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    categories: BTreeMap<String, CategoryMetrics>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, category: &str, metric: &str, value: MetricValue) {
        let slot = self
            .categories
            .entry(category.to_string())
            .or_default()
            .entry(metric.to_string())
            .or_insert(0);
        *slot = slot.saturating_add(value);
    }

    /// Fold one upstream payload fetched for `query_category` into the set.
    ///
    /// Statistics categories are qualified as `{query_category}_{jsonCategory}`;
    /// monitoring payloads are flat and land under `query_category` itself.
    /// Monitoring readings that fail to coerce are logged and dropped.
    pub fn absorb(&mut self, query_category: &str, payload: Payload) {
        match payload {
            Payload::Statistics(stats) => {
                for (json_category, metrics) in stats {
                    let qualified = format!("{query_category}_{json_category}");
                    for (metric, value) in metrics {
                        self.accumulate(&qualified, &metric, value);
                    }
                }
            }
            Payload::Monitoring(readings) => {
                for (metric, raw) in readings {
                    match coerce_reading(&raw) {
                        Ok(value) => self.accumulate(query_category, &metric, value),
                        Err(err) => warn!(
                            category = %query_category,
                            metric = %metric,
                            error = %err,
                            "dropping unreadable monitoring value"
                        ),
                    }
                }
            }
        }
    }

    /// Additive union; used to combine the statistics and monitoring fragments.
    pub fn merge(&mut self, other: Dataset) {
        for (category, metrics) in other.categories {
            for (metric, value) in metrics {
                self.accumulate(&category, &metric, value);
            }
        }
    }

    pub fn get(&self, category: &str, metric: &str) -> Option<MetricValue> {
        self.categories.get(category)?.get(metric).copied()
    }

    pub fn category(&self, category: &str) -> Option<&CategoryMetrics> {
        self.categories.get(category)
    }

    /// True when no metric value is held at all.
    pub fn is_empty(&self) -> bool {
        self.categories.values().all(|metrics| metrics.is_empty())
    }

    pub fn len_metrics(&self) -> usize {
        self.categories.values().map(|metrics| metrics.len()).sum()
    }

    /// `(category, metric, value)` triples in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, MetricValue)> + '_ {
        self.categories.iter().flat_map(|(category, metrics)| {
            metrics
                .iter()
                .map(move |(metric, value)| (category.as_str(), metric.as_str(), *value))
        })
    }
}
