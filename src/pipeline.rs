//! The aggregation pipeline: raw feeds in, velocity report out.
//!
//! One invocation owns its entire aggregate collection; nothing is
//! shared between runs and nothing is mutated after finalization. The
//! only await points are the throttled detail lookups.

use std::time::Duration;

use chrono::Utc;

use crate::aggregate::{BudgetIndex, PeriodAggregator};
use crate::enrich::{ProjectDetailSource, ThrottledDetailFetcher, DEFAULT_DETAIL_SPACING};
use crate::error::VelocityError;
use crate::resolver;
use crate::types::{ClientAggregate, Period, RawBudgetEntry, RawTimeEntry, VelocityReport};
use crate::velocity::finalize_velocities;

/// Everything the fetch layer hands the core for one report run.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    /// Contiguous, non-overlapping, oldest-first period descriptors.
    /// Their count fixes the bucket length for the whole run.
    pub periods: Vec<Period>,
    pub time_entries: Vec<RawTimeEntry>,
    /// Flat budget report; not period-scoped. May be empty, which only
    /// zero-fills per-client budget fields.
    pub budget_entries: Vec<RawBudgetEntry>,
}

/// Run the full aggregation with the default detail-dispatch spacing.
pub async fn run_pipeline(
    input: PipelineInput,
    detail_source: &dyn ProjectDetailSource,
) -> Result<VelocityReport, VelocityError> {
    run_pipeline_with_spacing(input, detail_source, DEFAULT_DETAIL_SPACING).await
}

/// Run the full aggregation, spacing detail dispatches by `spacing`.
///
/// Fails only with [`VelocityError::NoTimeData`] when zero usable time
/// entries were supplied across all periods. Every other anomaly is
/// absorbed where it occurs.
pub async fn run_pipeline_with_spacing(
    input: PipelineInput,
    detail_source: &dyn ProjectDetailSource,
    spacing: Duration,
) -> Result<VelocityReport, VelocityError> {
    let period_count = input.periods.len();

    // Fold the time feed.
    let mut aggregator = PeriodAggregator::new(period_count);
    for entry in &input.time_entries {
        aggregator.add_entry(entry);
    }
    if aggregator.is_empty() {
        return Err(VelocityError::NoTimeData);
    }
    log::info!(
        "aggregated {} time entries into {} clients over {} periods",
        input.time_entries.len(),
        aggregator.len(),
        period_count
    );

    // Fold the budget feed; seed aggregates for clients only it mentions.
    let mut budget_index = BudgetIndex::from_entries(&input.budget_entries);
    let budget_names: Vec<String> = budget_index
        .canonical_names()
        .map(str::to_string)
        .collect();
    for name in budget_names {
        aggregator.touch(&name);
    }

    // Resolve each client's latest project, enriching candidates with
    // dates through the throttled source.
    let mut fetcher = ThrottledDetailFetcher::new(detail_source, spacing);
    let mut clients = Vec::with_capacity(aggregator.len());

    for buckets in aggregator.into_clients() {
        let total_hours_used: f64 = buckets.period_hours.iter().sum();

        let mut aggregate = ClientAggregate {
            canonical_name: buckets.canonical_name,
            period_hours: buckets.period_hours,
            total_hours_used,
            total_hours_pack: 0.0,
            total_hours_remaining: 0.0,
            avg_velocity: 0.0,
            latest_project: None,
        };

        if let Some(mut candidates) = budget_index.take(&aggregate.canonical_name) {
            for candidate in candidates.iter_mut() {
                candidate.detail = fetcher.fetch(candidate.project_id).await;
            }
            if let Some(resolved) = resolver::resolve_latest(&candidates) {
                let figures = resolver::budget_figures(resolved);
                aggregate.total_hours_pack = figures.total_hours_pack;
                aggregate.total_hours_remaining = figures.total_hours_remaining;
                aggregate.latest_project = Some(resolver::latest_project(resolved));
            }
        }

        clients.push(aggregate);
    }

    let portfolio_velocity = finalize_velocities(&mut clients, period_count);
    log::info!(
        "velocity report ready: {} clients, portfolio velocity {}",
        clients.len(),
        portfolio_velocity
    );

    Ok(VelocityReport {
        portfolio_velocity,
        clients,
        periods: input.periods,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::NoDetailSource;
    use crate::error::DetailFetchError;
    use crate::types::{BudgetBy, ProjectDetail};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn periods(count: usize) -> Vec<Period> {
        (0..count)
            .map(|i| Period {
                period_index: i,
                from_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
                    + chrono::Duration::weeks(i as i64),
                to_date: NaiveDate::from_ymd_opt(2025, 1, 7).unwrap()
                    + chrono::Duration::weeks(i as i64),
            })
            .collect()
    }

    fn time_entry(id: u64, client: &str, period_index: usize, hours: f64) -> RawTimeEntry {
        RawTimeEntry {
            project_id: id,
            project_name: format!("{client} Pack"),
            client_display_name: client.to_string(),
            total_hours: hours,
            period_index,
        }
    }

    fn budget_entry(id: u64, name: &str, client: &str, budget: f64, remaining: f64) -> RawBudgetEntry {
        RawBudgetEntry {
            project_id: id,
            project_name: name.to_string(),
            client_display_name: client.to_string(),
            budget: Some(budget),
            budget_spent: budget - remaining,
            budget_remaining: Some(remaining),
            budget_by: BudgetBy::Project,
            is_active: true,
        }
    }

    /// Detail source backed by a fixed map; unknown ids fail.
    struct MapSource {
        details: HashMap<u64, ProjectDetail>,
    }

    #[async_trait]
    impl ProjectDetailSource for MapSource {
        async fn fetch_detail(
            &self,
            project_id: u64,
        ) -> Result<Option<ProjectDetail>, DetailFetchError> {
            self.details
                .get(&project_id)
                .cloned()
                .map(Some)
                .ok_or(DetailFetchError::Status(404))
        }
    }

    #[tokio::test]
    async fn empty_time_feed_reports_no_data() {
        init_logging();
        let input = PipelineInput {
            periods: periods(8),
            time_entries: Vec::new(),
            budget_entries: vec![budget_entry(1, "Acme Pack 1", "Acme", 40.0, 12.0)],
        };
        let err = run_pipeline(input, &NoDetailSource).await.unwrap_err();
        assert!(matches!(err, VelocityError::NoTimeData));
    }

    #[tokio::test]
    async fn merges_feeds_onto_canonical_clients() {
        init_logging();
        let input = PipelineInput {
            periods: periods(8),
            time_entries: vec![
                time_entry(1, "Acme Hours '25 Pack #1", 0, 10.0),
                time_entry(2, "Acme Pack 2", 1, 15.0),
            ],
            budget_entries: vec![budget_entry(2, "Acme Pack 2", "Acme '25", 40.0, 12.0)],
        };

        let report = run_pipeline_with_spacing(input, &NoDetailSource, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.clients.len(), 1);

        let acme = &report.clients[0];
        assert_eq!(acme.canonical_name, "Acme");
        assert_eq!(acme.total_hours_used, 25.0);
        assert_eq!(acme.period_hours.iter().sum::<f64>(), acme.total_hours_used);
        assert_eq!(acme.avg_velocity, 3.1);
        assert_eq!(acme.total_hours_pack, 40.0);
        assert_eq!(acme.total_hours_remaining, 12.0);
        assert_eq!(
            acme.latest_project.as_ref().unwrap().project_name,
            "Acme Pack 2"
        );
    }

    #[tokio::test]
    async fn enrichment_dates_drive_resolution() {
        let mut details = HashMap::new();
        details.insert(
            11,
            ProjectDetail {
                project_id: 11,
                start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
                created_at: None,
                updated_at: None,
            },
        );
        details.insert(
            12,
            ProjectDetail {
                project_id: 12,
                start_date: NaiveDate::from_ymd_opt(2025, 2, 1),
                created_at: None,
                updated_at: None,
            },
        );
        let source = MapSource { details };

        let input = PipelineInput {
            periods: periods(4),
            time_entries: vec![time_entry(11, "Globex", 0, 8.0)],
            budget_entries: vec![
                // Name heuristics alone would favor the '24 tag over the
                // untagged pack; the start dates override them.
                budget_entry(11, "Globex '24 Pack 9", "Globex", 40.0, 5.0),
                budget_entry(12, "Globex Retainer", "Globex", 60.0, 44.0),
            ],
        };

        let report = run_pipeline_with_spacing(input, &source, Duration::ZERO)
            .await
            .unwrap();
        let globex = &report.clients[0];
        let latest = globex.latest_project.as_ref().unwrap();
        assert_eq!(latest.project_id, 12);
        assert_eq!(latest.start_date, NaiveDate::from_ymd_opt(2025, 2, 1));
        assert_eq!(globex.total_hours_pack, 60.0);
        assert_eq!(globex.total_hours_remaining, 44.0);
    }

    #[tokio::test]
    async fn failed_enrichment_degrades_to_name_rules() {
        // MapSource with no entries: every fetch errors with 404.
        let source = MapSource {
            details: HashMap::new(),
        };

        let input = PipelineInput {
            periods: periods(4),
            time_entries: vec![time_entry(21, "Initech", 2, 12.0)],
            budget_entries: vec![
                budget_entry(21, "Initech '24 Pack", "Initech", 40.0, 0.0),
                budget_entry(22, "Initech '25 Pack", "Initech", 40.0, 36.0),
            ],
        };

        let report = run_pipeline_with_spacing(input, &source, Duration::ZERO)
            .await
            .unwrap();
        let latest = report.clients[0].latest_project.as_ref().unwrap();
        assert_eq!(latest.project_id, 22);
        assert_eq!(latest.start_date, None);
    }

    #[tokio::test]
    async fn budget_only_clients_appear_with_zero_hours() {
        let input = PipelineInput {
            periods: periods(4),
            time_entries: vec![time_entry(1, "Acme", 0, 4.0)],
            budget_entries: vec![budget_entry(31, "Hooli Pack 1", "Hooli", 20.0, 20.0)],
        };

        let report = run_pipeline_with_spacing(input, &NoDetailSource, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.clients.len(), 2);

        let hooli = report
            .clients
            .iter()
            .find(|c| c.canonical_name == "Hooli")
            .unwrap();
        assert_eq!(hooli.total_hours_used, 0.0);
        assert_eq!(hooli.avg_velocity, 0.0);
        assert_eq!(hooli.total_hours_pack, 20.0);
    }

    #[tokio::test]
    async fn identical_runs_produce_identical_client_order() {
        // Many budget-only clients all tie at zero velocity; their order
        // must come from feed encounter order, not map iteration order.
        let mut budget_entries = Vec::new();
        for i in 0..12u64 {
            budget_entries.push(budget_entry(
                100 + i,
                &format!("Studio{i} Pack 1"),
                &format!("Studio{i}"),
                20.0,
                20.0,
            ));
        }
        let input = PipelineInput {
            periods: periods(4),
            time_entries: vec![time_entry(1, "Acme", 0, 4.0)],
            budget_entries,
        };

        let first = run_pipeline_with_spacing(input.clone(), &NoDetailSource, Duration::ZERO)
            .await
            .unwrap();
        let second = run_pipeline_with_spacing(input, &NoDetailSource, Duration::ZERO)
            .await
            .unwrap();

        let order = |report: &VelocityReport| -> Vec<String> {
            report
                .clients
                .iter()
                .map(|c| c.canonical_name.clone())
                .collect()
        };
        assert_eq!(order(&first), order(&second));
        // Encounter order, not hash order: time-feed client first, then
        // budget-only clients as the budget feed introduced them.
        let expected: Vec<String> = std::iter::once("Acme".to_string())
            .chain((0..12).map(|i| format!("Studio{i}")))
            .collect();
        assert_eq!(order(&first), expected);
    }

    #[tokio::test]
    async fn clients_without_budget_get_zeroed_fields() {
        let input = PipelineInput {
            periods: periods(4),
            time_entries: vec![time_entry(1, "Acme", 0, 4.0)],
            budget_entries: Vec::new(),
        };

        let report = run_pipeline_with_spacing(input, &NoDetailSource, Duration::ZERO)
            .await
            .unwrap();
        let acme = &report.clients[0];
        assert_eq!(acme.total_hours_pack, 0.0);
        assert_eq!(acme.total_hours_remaining, 0.0);
        assert!(acme.latest_project.is_none());
    }

    #[tokio::test]
    async fn report_echoes_period_descriptors() {
        let input = PipelineInput {
            periods: periods(6),
            time_entries: vec![time_entry(1, "Acme", 5, 4.0)],
            budget_entries: Vec::new(),
        };

        let report = run_pipeline_with_spacing(input, &NoDetailSource, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.periods.len(), 6);
        assert_eq!(report.periods[0].period_index, 0);
        assert_eq!(report.clients[0].period_hours.len(), 6);
    }
}
