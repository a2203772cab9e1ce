//! Latest-project resolution.
//!
//! A client usually has several budget-linked projects: finished packs,
//! a current pack, sometimes a legacy record with no dates at all. One
//! of them has to represent "current engagement" on the report. Explicit
//! dates are ground truth when present; textual year tags and pack
//! numbers are the fallback for legacy records.
//!
//! The tie-break chain is an ordered rule list applied left to right;
//! the first rule that yields a non-tie decides. Keeping it as a list
//! keeps each rule independently testable and the order auditable.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

use crate::types::{BudgetBy, LatestProject, ProjectDetail, RawBudgetEntry};

/// One budget-linked project competing to represent a client.
#[derive(Debug, Clone)]
pub struct ProjectCandidate {
    pub project_id: u64,
    pub project_name: String,
    pub budget: Option<f64>,
    pub budget_remaining: Option<f64>,
    pub budget_by: BudgetBy,
    /// Enrichment dates; stays `None` when the detail fetch failed, which
    /// degrades this candidate to the name-based rules.
    pub detail: Option<ProjectDetail>,
}

impl ProjectCandidate {
    pub fn from_budget_entry(entry: &RawBudgetEntry) -> Self {
        Self {
            project_id: entry.project_id,
            project_name: entry.project_name.clone(),
            budget: entry.budget,
            budget_remaining: entry.budget_remaining,
            budget_by: entry.budget_by,
            detail: None,
        }
    }

    fn start_date(&self) -> Option<chrono::NaiveDate> {
        self.detail.as_ref().and_then(|d| d.start_date)
    }

    fn created_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.detail.as_ref().and_then(|d| d.created_at)
    }
}

type Rule = fn(&ProjectCandidate, &ProjectCandidate) -> Ordering;

/// The tie-break chain, in priority order. First non-tie wins.
const RULES: &[(&str, Rule)] = &[
    ("start_date", by_start_date),
    ("created_at", by_created_at),
    ("year_tag", by_year_tag),
    ("name_number", by_name_number),
];

/// Later `start_date` wins; a tie unless both dates are present and differ.
fn by_start_date(a: &ProjectCandidate, b: &ProjectCandidate) -> Ordering {
    match (a.start_date(), b.start_date()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => Ordering::Equal,
    }
}

/// Later `created_at` wins; same both-present requirement as start_date.
fn by_created_at(a: &ProjectCandidate, b: &ProjectCandidate) -> Ordering {
    match (a.created_at(), b.created_at()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => Ordering::Equal,
    }
}

/// The most recent `'NN` year tag in the name wins; a tagged name beats
/// an untagged one.
fn by_year_tag(a: &ProjectCandidate, b: &ProjectCandidate) -> Ordering {
    year_tag_rank(&a.project_name).cmp(&year_tag_rank(&b.project_name))
}

/// Higher first integer literal in the name wins ("Pack 3" beats
/// "Pack 2"); a numbered name beats an unnumbered one.
fn by_name_number(a: &ProjectCandidate, b: &ProjectCandidate) -> Ordering {
    first_number(&a.project_name).cmp(&first_number(&b.project_name))
}

fn re_year_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"'(\d{2})").unwrap())
}

fn re_integer() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").unwrap())
}

fn year_tag_rank(name: &str) -> Option<u32> {
    re_year_tag()
        .captures_iter(name)
        .filter_map(|c| c[1].parse::<u32>().ok())
        .max()
}

fn first_number(name: &str) -> Option<u64> {
    re_integer()
        .find(name)?
        .as_str()
        .parse::<u64>()
        .ok()
}

fn compare(a: &ProjectCandidate, b: &ProjectCandidate) -> Ordering {
    for (name, rule) in RULES {
        let ord = rule(a, b);
        if ord != Ordering::Equal {
            log::debug!(
                "resolver: {} vs {} decided by {} rule",
                a.project_name,
                b.project_name,
                name
            );
            return ord;
        }
    }
    Ordering::Equal
}

/// Select the candidate representing current engagement.
///
/// Ties keep encounter order: a later candidate replaces the current best
/// only when a rule ranks it strictly higher. Returns `None` only for an
/// empty slice.
pub fn resolve_latest(candidates: &[ProjectCandidate]) -> Option<&ProjectCandidate> {
    let (first, rest) = candidates.split_first()?;
    let mut best = first;
    for candidate in rest {
        if compare(candidate, best) == Ordering::Greater {
            best = candidate;
        }
    }
    Some(best)
}

/// Hour-budget figures copied from a resolved candidate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BudgetFigures {
    pub total_hours_pack: f64,
    pub total_hours_remaining: f64,
}

/// Copy budget figures off a candidate according to its `budget_by` kind.
///
/// Figures are taken verbatim from the feed, never recomputed from usage:
/// the billing service's remaining figure already accounts for hours this
/// report may not have seen.
pub fn budget_figures(candidate: &ProjectCandidate) -> BudgetFigures {
    match candidate.budget_by {
        BudgetBy::Project => BudgetFigures {
            total_hours_pack: candidate.budget.unwrap_or(0.0),
            total_hours_remaining: candidate.budget_remaining.unwrap_or(0.0),
        },
        // No hour budget is derivable from a cost budget; the remaining
        // figure serves as a best-effort hours proxy when positive.
        BudgetBy::ProjectCost => {
            let remaining = candidate.budget_remaining.unwrap_or(0.0);
            if remaining > 0.0 {
                BudgetFigures {
                    total_hours_pack: 0.0,
                    total_hours_remaining: remaining,
                }
            } else {
                BudgetFigures::default()
            }
        }
        BudgetBy::Other => BudgetFigures {
            total_hours_pack: candidate.budget.unwrap_or(0.0),
            total_hours_remaining: candidate.budget_remaining.unwrap_or(0.0),
        },
    }
}

/// Build the report-facing latest-project record from a resolved candidate.
pub fn latest_project(candidate: &ProjectCandidate) -> LatestProject {
    LatestProject {
        project_id: candidate.project_id,
        project_name: candidate.project_name.clone(),
        start_date: candidate.start_date(),
        created_at: candidate.created_at(),
    }
}
