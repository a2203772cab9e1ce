//! Data model for the velocity aggregation core.
//!
//! Raw feed records mirror the billing service's wire format (snake_case
//! JSON), so the fetch layer can deserialize API payloads straight into
//! them. Aggregate types are what the presentation/API layer consumes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One project's hours within a single report period, as returned by the
/// time-report feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTimeEntry {
    pub project_id: u64,
    pub project_name: String,
    /// Display name of the client as entered in the billing service.
    /// Noisy: may carry pack numbers, part numbers, and year tags.
    pub client_display_name: String,
    #[serde(default)]
    pub total_hours: f64,
    /// 0-based index into the run's period sequence (0 = oldest).
    pub period_index: usize,
}

/// One project's row from the budget report feed. Not period-scoped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBudgetEntry {
    pub project_id: u64,
    pub project_name: String,
    pub client_display_name: String,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub budget_spent: f64,
    #[serde(default)]
    pub budget_remaining: Option<f64>,
    #[serde(default)]
    pub budget_by: BudgetBy,
    #[serde(default)]
    pub is_active: bool,
}

/// How a project's budget is denominated in the billing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetBy {
    /// Hour budget for the whole project.
    Project,
    /// Monetary budget; hours are not directly derivable.
    ProjectCost,
    /// Any other denomination the service supports.
    #[default]
    #[serde(other)]
    Other,
}

/// Optional per-project enrichment, fetched lazily for budget-linked
/// projects only. Date fields stay `None` when the lookup fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetail {
    pub project_id: u64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One reporting bucket in the run's fixed, oldest-first period sequence.
/// Echoed on the report so the presentation layer can label columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    pub period_index: usize,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

/// The budget-linked project selected to represent a client's current
/// engagement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestProject {
    pub project_id: u64,
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One canonical, deduplicated client with its bucketed hours, budget
/// status, and velocity. Finalized exactly once per pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientAggregate {
    pub canonical_name: String,
    /// Index-aligned to `period_index`; length is the run's period count.
    pub period_hours: Vec<f64>,
    pub total_hours_used: f64,
    /// 0 when no budget entry matched this client.
    pub total_hours_pack: f64,
    /// Signed; negative means overage.
    pub total_hours_remaining: f64,
    /// `total_hours_used / period_count`, rounded to one decimal.
    pub avg_velocity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_project: Option<LatestProject>,
}

/// Portfolio rollup: every client, sorted by velocity descending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityReport {
    /// Sum of the already-rounded per-client velocities, re-rounded.
    pub portfolio_velocity: f64,
    pub clients: Vec<ClientAggregate>,
    pub periods: Vec<Period>,
    pub generated_at: DateTime<Utc>,
}
