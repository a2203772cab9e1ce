//! Project-detail enrichment seam.
//!
//! The core never issues HTTP itself; the caller hands it a
//! [`ProjectDetailSource`] wrapping their fetch layer. Lookups happen
//! only for budget-linked projects, strictly one at a time: the billing
//! service enforces a request-rate ceiling, so dispatches are spaced by
//! a minimum delay rather than parallelized. A failed lookup is a soft
//! skip, never a run failure.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::DetailFetchError;
use crate::types::ProjectDetail;

/// Minimum spacing between detail dispatches. The billing service allows
/// 100 requests per 15 seconds; 150 ms keeps a run safely under that
/// even when the caller is fetching other reports concurrently.
pub const DEFAULT_DETAIL_SPACING: Duration = Duration::from_millis(150);

/// Lookup of per-project dates, implemented by the caller over their
/// HTTP layer. `Ok(None)` means the service has no detail record for the
/// project; both that and `Err` leave the candidate without dates.
#[async_trait]
pub trait ProjectDetailSource: Send + Sync {
    async fn fetch_detail(&self, project_id: u64) -> Result<Option<ProjectDetail>, DetailFetchError>;
}

/// Serializes detail lookups with an enforced minimum inter-dispatch gap.
///
/// Owned by one pipeline run. The gap is awaited, not slept on a blocked
/// thread, so the caller can still cancel the run by dropping the future.
pub struct ThrottledDetailFetcher<'a> {
    source: &'a dyn ProjectDetailSource,
    spacing: Duration,
    last_dispatch: Option<Instant>,
}

impl<'a> ThrottledDetailFetcher<'a> {
    pub fn new(source: &'a dyn ProjectDetailSource, spacing: Duration) -> Self {
        Self {
            source,
            spacing,
            last_dispatch: None,
        }
    }

    /// Fetch one project's detail, waiting out the spacing window first.
    ///
    /// Errors are absorbed here: the failure is logged and the candidate
    /// proceeds without dates, degrading resolution to the name rules.
    pub async fn fetch(&mut self, project_id: u64) -> Option<ProjectDetail> {
        if let Some(last) = self.last_dispatch {
            // No-op when the deadline already passed.
            tokio::time::sleep_until(last + self.spacing).await;
        }
        self.last_dispatch = Some(Instant::now());

        match self.source.fetch_detail(project_id).await {
            Ok(detail) => detail,
            Err(err) => {
                if err.is_transient() {
                    log::warn!(
                        "detail fetch for project {} failed transiently ({}); resolving from name heuristics, a later run may recover dates",
                        project_id,
                        err
                    );
                } else {
                    log::warn!(
                        "detail fetch for project {} failed ({}); resolving from name heuristics",
                        project_id,
                        err
                    );
                }
                None
            }
        }
    }
}

/// A source for callers that have no detail endpoint available. Every
/// candidate resolves from name heuristics alone.
pub struct NoDetailSource;

#[async_trait]
impl ProjectDetailSource for NoDetailSource {
    async fn fetch_detail(&self, _project_id: u64) -> Result<Option<ProjectDetail>, DetailFetchError> {
        Ok(None)
    }
}
