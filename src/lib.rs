//! Client identity resolution and velocity aggregation.
//!
//! Takes raw, noisy per-project records from two independent billing
//! service feeds (time report, budget report) and produces one canonical
//! record per real-world client: period-bucketed hours, remaining-budget
//! status, a resolved "latest" project, and a velocity figure, plus a
//! portfolio rollup sorted by velocity.
//!
//! Fetching, rendering, and serving are the caller's concern. The one
//! seam back into the caller's I/O is [`enrich::ProjectDetailSource`],
//! used for throttled per-project date lookups during resolution.
//!
//! ```no_run
//! use velocity_core::{run_pipeline, NoDetailSource, PipelineInput};
//!
//! # async fn demo(input: PipelineInput) -> Result<(), velocity_core::VelocityError> {
//! let report = run_pipeline(input, &NoDetailSource).await?;
//! for client in &report.clients {
//!     println!("{}: {} h/period", client.canonical_name, client.avg_velocity);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod enrich;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod resolver;
pub mod types;
pub mod velocity;

pub use enrich::{NoDetailSource, ProjectDetailSource, ThrottledDetailFetcher};
pub use error::{DetailFetchError, VelocityError};
pub use normalize::{normalize_client_name, UNKNOWN_CLIENT};
pub use pipeline::{run_pipeline, run_pipeline_with_spacing, PipelineInput};
pub use types::{
    BudgetBy, ClientAggregate, LatestProject, Period, ProjectDetail, RawBudgetEntry, RawTimeEntry,
    VelocityReport,
};
