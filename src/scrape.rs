// Scrape orchestration
// Runs the statistics and monitoring aggregations concurrently for one
// scrape and combines their fragments into a single dataset

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::aggregate::Aggregator;
use crate::config::{AppConfig, SourceConfig};
use crate::dataset::Dataset;
use crate::errors::ExporterError;
use crate::source::SourceKind;
use crate::transport::UpstreamClient;

#[derive(Debug, Clone)]
pub struct Scraper {
    aggregator: Arc<Aggregator>,
    statistics: Option<SourceConfig>,
    monitoring: Option<SourceConfig>,
}

impl Scraper {
    pub fn new(
        aggregator: Aggregator,
        statistics: Option<SourceConfig>,
        monitoring: Option<SourceConfig>,
    ) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            statistics,
            monitoring,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ExporterError> {
        let client = UpstreamClient::new(config.upstream_timeout())?;
        Ok(Self::new(
            Aggregator::new(client, config.query_params.clone()),
            config.statistics.clone(),
            config.monitoring.clone(),
        ))
    }

    /// Sources that take part in a scrape, statistics first.
    pub fn active_sources(&self) -> Vec<(SourceKind, SourceConfig)> {
        [
            (SourceKind::Statistics, &self.statistics),
            (SourceKind::Monitoring, &self.monitoring),
        ]
        .into_iter()
        .filter_map(|(kind, source)| {
            source
                .as_ref()
                .filter(|s| s.is_active())
                .map(|s| (kind, s.clone()))
        })
        .collect()
    }

    /// Fetch every active source and merge the results.
    ///
    /// Each source runs in its own task. A failed task aborts its sibling
    /// and fails the scrape; a scrape that ends up with no
    /// metrics at all reports [`ExporterError::NoData`].
    pub async fn scrape(&self) -> Result<Dataset, ExporterError> {
        let sources = self.active_sources();
        if sources.is_empty() {
            debug!("no active source configured");
            return Err(ExporterError::NoData);
        }

        let started = Instant::now();
        let mut branches = JoinSet::new();
        for (kind, source) in sources {
            let aggregator = Arc::clone(&self.aggregator);
            branches.spawn(async move { (kind, aggregator.aggregate(kind, &source).await) });
        }

        let combined = join_branches(branches).await?;
        if combined.is_empty() {
            return Err(ExporterError::NoData);
        }

        info!(
            metrics = combined.len_metrics(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scrape complete"
        );
        Ok(combined)
    }
}

type BranchOutcome = (SourceKind, Result<Dataset, ExporterError>);

/// Merge branch results as they finish. The first error aborts whatever is
/// still running and is returned without waiting for it.
async fn join_branches(mut branches: JoinSet<BranchOutcome>) -> Result<Dataset, ExporterError> {
    let mut combined = Dataset::new();
    while let Some(joined) = branches.join_next().await {
        let outcome = match joined {
            Ok((kind, outcome)) => outcome.map(|fragment| (kind, fragment)),
            Err(err) => Err(ExporterError::Task(err.to_string())),
        };
        match outcome {
            Ok((kind, fragment)) => {
                debug!(source = %kind, metrics = fragment.len_metrics(), "merging fragment");
                combined.merge(fragment);
            }
            Err(err) => {
                if !branches.is_empty() {
                    warn!(error = %err, "cancelling remaining source after failure");
                }
                branches.abort_all();
                return Err(err);
            }
        }
    }
    Ok(combined)
}
