//! Error types for the aggregation core.
//!
//! Almost nothing here is fatal: per-record anomalies are absorbed with
//! documented defaults where they occur. The only condition surfaced to
//! the caller is a run with no time data at all, so the presentation
//! layer can show an empty state instead of a report.

use thiserror::Error;

/// Errors surfaced by the aggregation pipeline.
#[derive(Debug, Error)]
pub enum VelocityError {
    /// Zero time-entry records across all periods. An empty state, not a
    /// crash; callers should render "no data" rather than retry.
    #[error("no time entries were supplied for any report period")]
    NoTimeData,
}

/// Failure of a single project-detail lookup against the billing service.
///
/// Returned by [`crate::enrich::ProjectDetailSource`] implementations.
/// The pipeline never propagates these: a failed lookup degrades that
/// candidate to the name-based resolver rules and the run continues.
#[derive(Debug, Error)]
pub enum DetailFetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("billing service returned status {0}")]
    Status(u16),

    #[error("malformed detail payload: {0}")]
    Malformed(String),
}

impl DetailFetchError {
    /// Whether a later run could plausibly succeed without intervention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DetailFetchError::Network(_) | DetailFetchError::Status(429 | 500..=599)
        )
    }
}
