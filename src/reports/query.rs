//! Immutable report queries and the pure compute pipeline.
//!
//! Every UI interaction produces a new `ReportQuery` value; nothing is
//! mutated in place. Recomputation is synchronous and always runs the
//! full pipeline: resolve window, join, classify, then aggregate or
//! search, then paginate.

use super::aggregate::{aggregate, AggregationRowView, SummaryFocus};
use super::domain::{DateField, FollowupStatus};
use super::export::format_day;
use super::join::{activity_rows, interaction_rows, join_leads, ActivityRow, InteractionRow};
use super::paginate::{paginate, PageInfo};
use super::search;
use super::snapshot::Snapshot;
use super::window::{resolve, Period};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// The complete filter state of a report view. Changing any upstream
/// filter resets the page to 1; changing only the page size keeps the
/// cursor and lets pagination clamp it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportQuery {
    pub period: Period,
    pub date_field: DateField,
    pub search: String,
    pub executive: Option<String>,
    pub status: Option<FollowupStatus>,
    pub focus: SummaryFocus,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            period: Period::All,
            date_field: DateField::Created,
            search: String::new(),
            executive: None,
            status: None,
            focus: SummaryFocus::All,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ReportQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_period(self, period: Period) -> Self {
        Self {
            period,
            page: 1,
            ..self
        }
    }

    /// Date-filter modes are mutually exclusive; selecting one replaces
    /// whichever was active.
    pub fn with_date_field(self, date_field: DateField) -> Self {
        Self {
            date_field,
            page: 1,
            ..self
        }
    }

    pub fn with_search(self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            page: 1,
            ..self
        }
    }

    pub fn with_executive(self, executive: Option<String>) -> Self {
        Self {
            executive,
            page: 1,
            ..self
        }
    }

    pub fn with_status(self, status: Option<FollowupStatus>) -> Self {
        Self {
            status,
            page: 1,
            ..self
        }
    }

    pub fn with_focus(self, focus: SummaryFocus) -> Self {
        Self {
            focus,
            page: 1,
            ..self
        }
    }

    pub fn with_page(self, page: usize) -> Self {
        Self { page, ..self }
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        Self { page_size, ..self }
    }
}

/// Executive performance summary for the active window.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub rows: Vec<AggregationRowView>,
    pub page: PageInfo,
    /// Full filtered set, pre-pagination; this is what exports see.
    #[serde(skip)]
    pub filtered: Vec<AggregationRowView>,
}

/// Per-lead followup worklist.
#[derive(Debug, Serialize)]
pub struct WorklistReport {
    pub rows: Vec<ActivityRow>,
    pub page: PageInfo,
    #[serde(skip)]
    pub filtered: Vec<ActivityRow>,
}

/// Searchable interaction log.
#[derive(Debug, Serialize)]
pub struct InteractionReport {
    pub rows: Vec<InteractionRow>,
    pub page: PageInfo,
    #[serde(skip)]
    pub filtered: Vec<InteractionRow>,
}

/// Aggregate classified leads per executive. The window filters which
/// leads are counted (by creation date); the classification flags look
/// at all-time interaction and followup history.
pub fn compute_summary(query: &ReportQuery, snapshot: &Snapshot, now: NaiveDateTime) -> SummaryReport {
    let window = resolve(query.period, now.date());
    let activities = join_leads(snapshot, now);

    let classified = activities
        .iter()
        .filter(|activity| window.admits(activity.lead.created_day()))
        .filter(|activity| {
            query
                .executive
                .as_deref()
                .map_or(true, |wanted| activity.executive_name == wanted)
        })
        .map(|activity| (activity.executive_name.as_str(), activity.flags));

    let filtered: Vec<AggregationRowView> = aggregate(classified)
        .into_iter()
        .filter(|row| query.focus.admits(row))
        .map(|row| row.to_view())
        .filter(|view| {
            search::matches(
                &[
                    &view.executive_name,
                    &view.no_interaction_ratio,
                    &view.no_appointment_ratio,
                    &view.missed_ratio,
                ],
                &query.search,
            )
        })
        .collect();

    let (window_rows, page) = paginate(&filtered, query.page, query.page_size);
    SummaryReport {
        rows: window_rows.to_vec(),
        page,
        filtered,
    }
}

/// Followup worklist: one row per lead-followup pair, window-filtered
/// by the active date mode, searched, and sorted by governing date.
pub fn compute_worklist(query: &ReportQuery, snapshot: &Snapshot, now: NaiveDateTime) -> WorklistReport {
    let window = resolve(query.period, now.date());
    let activities = join_leads(snapshot, now);

    let mut filtered: Vec<ActivityRow> = activity_rows(snapshot, &activities)
        .into_iter()
        .filter(|row| window.admits(row.governing_date(query.date_field)))
        .filter(|row| {
            query
                .executive
                .as_deref()
                .map_or(true, |wanted| row.executive_name == wanted)
        })
        .filter(|row| {
            query
                .status
                .map_or(true, |wanted| row.followup_status == Some(wanted))
        })
        .filter(|row| {
            search::matches(
                &[
                    &row.business_name,
                    &row.contact_name,
                    &row.mobile,
                    &row.email,
                    &row.executive_name,
                    &row.followup_kind,
                    &row.followup_note,
                    &row.last_interaction_summary,
                    &format_day(row.scheduled_at),
                ],
                &query.search,
            )
        })
        .collect();

    // Earliest governing date first; undated rows sink to the end.
    filtered.sort_by_key(|row| {
        let governing = row.governing_date(query.date_field);
        (governing.is_none(), governing)
    });

    let (window_rows, page) = paginate(&filtered, query.page, query.page_size);
    WorklistReport {
        rows: window_rows.to_vec(),
        page,
        filtered,
    }
}

/// Interaction log, window-filtered by interaction date, newest first.
pub fn compute_interactions(
    query: &ReportQuery,
    snapshot: &Snapshot,
    now: NaiveDateTime,
) -> InteractionReport {
    let window = resolve(query.period, now.date());
    let activities = join_leads(snapshot, now);

    let filtered: Vec<InteractionRow> = interaction_rows(snapshot, &activities)
        .into_iter()
        .filter(|row| window.admits(row.occurred_at.map(|dt| dt.date())))
        .filter(|row| {
            query
                .executive
                .as_deref()
                .map_or(true, |wanted| row.executive_name == wanted)
        })
        .filter(|row| {
            search::matches(
                &[
                    &row.business_name,
                    &row.contact_name,
                    &row.mobile,
                    &row.executive_name,
                    &row.kind,
                    &row.summary,
                    &row.note,
                    &format_day(row.occurred_at),
                ],
                &query.search,
            )
        })
        .collect();

    let (window_rows, page) = paginate(&filtered, query.page, query.page_size);
    InteractionReport {
        rows: window_rows.to_vec(),
        page,
        filtered,
    }
}
