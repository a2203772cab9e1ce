//! Folding raw feed records into per-client accumulators.
//!
//! Both collections here are owned by a single pipeline run: built by
//! folding, read once during finalization, never shared across runs.

use std::collections::HashMap;

use crate::normalize::normalize_client_name;
use crate::resolver::ProjectCandidate;
use crate::types::{RawBudgetEntry, RawTimeEntry};

/// Hour buckets under construction for one canonical client.
#[derive(Debug, Clone)]
pub struct ClientBuckets {
    pub canonical_name: String,
    /// Zero-filled at creation; fixed length, never resized.
    pub period_hours: Vec<f64>,
}

/// Insertion-ordered accumulator map keyed on canonical client name.
///
/// Encounter order is preserved so that downstream stable sorts keep a
/// reproducible order for velocity ties.
#[derive(Debug)]
pub struct PeriodAggregator {
    period_count: usize,
    index: HashMap<String, usize>,
    clients: Vec<ClientBuckets>,
}

impl PeriodAggregator {
    pub fn new(period_count: usize) -> Self {
        Self {
            period_count,
            index: HashMap::new(),
            clients: Vec::new(),
        }
    }

    pub fn period_count(&self) -> usize {
        self.period_count
    }

    /// Fold one time entry into its client's bucket.
    ///
    /// Hours accumulate: several projects under the same canonical client
    /// in the same period sum together. Negative hours count as zero, and
    /// an out-of-range period index drops the record with a warning.
    pub fn add_entry(&mut self, entry: &RawTimeEntry) {
        if entry.period_index >= self.period_count {
            log::warn!(
                "dropping time entry for project {} ({}): period index {} out of range ({} periods)",
                entry.project_id,
                entry.project_name,
                entry.period_index,
                self.period_count
            );
            return;
        }

        let canonical = normalize_client_name(&entry.client_display_name);
        let hours = entry.total_hours.max(0.0);
        let slot = self.slot_for(canonical);
        self.clients[slot].period_hours[entry.period_index] += hours;
    }

    /// Ensure an accumulator exists for a canonical name without adding
    /// hours. Used when the budget feed mentions a client the time feed
    /// never did.
    pub fn touch(&mut self, canonical_name: &str) {
        self.slot_for(canonical_name.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Consume the accumulator, yielding clients in encounter order.
    pub fn into_clients(self) -> Vec<ClientBuckets> {
        self.clients
    }

    fn slot_for(&mut self, canonical_name: String) -> usize {
        if let Some(&slot) = self.index.get(&canonical_name) {
            return slot;
        }
        let slot = self.clients.len();
        self.clients.push(ClientBuckets {
            canonical_name: canonical_name.clone(),
            period_hours: vec![0.0; self.period_count],
        });
        self.index.insert(canonical_name, slot);
        slot
    }
}

/// Budget candidates grouped by canonical client name.
///
/// All candidates are preserved in encounter order; a client often has
/// several budget-linked projects (historical packs plus the current one)
/// and the resolver picks among them later. Group order is encounter
/// order too: names the time feed never mentioned are seeded into the
/// report in the order the budget feed introduced them, keeping
/// zero-velocity ties reproducible across runs.
#[derive(Debug, Default)]
pub struct BudgetIndex {
    order: Vec<String>,
    groups: HashMap<String, Vec<ProjectCandidate>>,
}

impl BudgetIndex {
    pub fn from_entries(entries: &[RawBudgetEntry]) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<ProjectCandidate>> = HashMap::new();
        for entry in entries {
            let canonical = normalize_client_name(&entry.client_display_name);
            let group = groups.entry(canonical.clone()).or_insert_with(|| {
                order.push(canonical.clone());
                Vec::new()
            });
            group.push(ProjectCandidate::from_budget_entry(entry));
        }
        Self { order, groups }
    }

    /// Canonical names present in the budget feed, in encounter order,
    /// for seeding aggregates the time feed never mentioned.
    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Remove and return all candidates for a client.
    pub fn take(&mut self, canonical_name: &str) -> Option<Vec<ProjectCandidate>> {
        self.groups.remove(canonical_name)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
