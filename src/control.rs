// Control plane: scrape admission
//
// Bounds how many scrapes run the fetch -> publish pipeline at once.
// With the default of one permit scrapes are fully serialized.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

#[derive(Clone)]
pub struct ScrapeAdmission {
    max_inflight: Arc<Semaphore>,
    limit: usize,
}

impl ScrapeAdmission {
    pub fn new(max_inflight: usize) -> Self {
        let limit = max_inflight.max(1);
        Self {
            max_inflight: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Wait for a scrape slot. The slot is released when the permit drops.
    pub async fn acquire(&self) -> ScrapePermit {
        if self.max_inflight.available_permits() == 0 {
            debug!(limit = self.limit, "scrape queued behind an in-flight scrape");
        }
        let permit = self
            .max_inflight
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore not closed");
        ScrapePermit { _permit: permit }
    }
}

impl Default for ScrapeAdmission {
    fn default() -> Self {
        Self::new(1)
    }
}

pub struct ScrapePermit {
    _permit: OwnedSemaphorePermit,
}
