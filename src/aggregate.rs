// Per-source aggregation
// Walks the configured categories of one source, fetching each and
// folding the payloads into a single dataset fragment

use tracing::{info, warn};
use url::Url;

use crate::config::SourceConfig;
use crate::dataset::Dataset;
use crate::errors::ExporterError;
use crate::source::SourceKind;
use crate::transport::{category_url, UpstreamClient};

#[derive(Debug, Clone)]
pub struct Aggregator {
    client: UpstreamClient,
    selector: String,
}

impl Aggregator {
    pub fn new(client: UpstreamClient, selector: impl Into<String>) -> Self {
        Self {
            client,
            selector: selector.into(),
        }
    }

    /// Fetch every category of `source` and merge the results.
    ///
    /// A category that cannot be fetched or decoded is logged and skipped. An
    /// unusable endpoint skips every category, leaving an empty fragment.
    pub async fn aggregate(
        &self,
        kind: SourceKind,
        source: &SourceConfig,
    ) -> Result<Dataset, ExporterError> {
        let base = match base_url(kind, source) {
            Ok(base) => base,
            Err(err) => {
                warn!(source = %kind, error = %err, "skipping source with unusable endpoint");
                return Ok(Dataset::new());
            }
        };

        let mut fragment = Dataset::new();
        let mut failed = 0usize;

        for category in &source.categories {
            let url = category_url(&base, kind, category, &self.selector);
            match self.client.fetch(&url, kind).await {
                Ok(payload) => fragment.absorb(category, payload),
                Err(err) => {
                    failed += 1;
                    warn!(url = %url, error = %err, "skipping upstream category");
                }
            }
        }

        info!(
            source = %kind,
            categories = source.categories.len(),
            failed = failed,
            metrics = fragment.len_metrics(),
            "source aggregated"
        );
        Ok(fragment)
    }
}

fn base_url(kind: SourceKind, source: &SourceConfig) -> Result<Url, ExporterError> {
    let endpoint = source.endpoint();
    let base = Url::parse(&endpoint).map_err(|e| ExporterError::Endpoint {
        kind,
        endpoint: endpoint.clone(),
        reason: e.to_string(),
    })?;
    if base.cannot_be_a_base() {
        return Err(ExporterError::Endpoint {
            kind,
            endpoint,
            reason: "not a base URL".to_string(),
        });
    }
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(address: &str) -> SourceConfig {
        SourceConfig {
            address: address.into(),
            port: 8080,
            categories: vec!["ports".into()],
        }
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let err = base_url(SourceKind::Statistics, &source("bad host")).unwrap_err();
        assert!(matches!(
            err,
            ExporterError::Endpoint {
                kind: SourceKind::Statistics,
                ..
            }
        ));
        assert!(base_url(SourceKind::Statistics, &source("stats.local")).is_ok());
    }

    #[tokio::test]
    async fn invalid_endpoint_yields_empty_fragment() {
        let aggregator = Aggregator::new(UpstreamClient::default(), "op");
        let fragment = aggregator
            .aggregate(SourceKind::Monitoring, &source("mon host"))
            .await
            .unwrap();
        assert!(fragment.is_empty());
    }
}
