//! Time-window sales activity aggregation and classification.
//!
//! Raw collections flow through normalization, joining, window
//! filtering, and classification, then fan out to the executive
//! summary, the followup worklist, and the interaction log. Exports
//! always see the filtered, pre-pagination set.

pub mod aggregate;
pub mod classify;
pub mod domain;
pub mod export;
pub mod join;
pub mod normalize;
pub mod paginate;
pub mod query;
pub mod search;
pub mod snapshot;
pub mod window;

pub use aggregate::{AggregationRow, AggregationRowView, SummaryFocus};
pub use classify::ActivityFlags;
pub use domain::{DateField, Employee, Followup, FollowupStatus, Interaction, Lead};
pub use export::{CsvTabularWriter, ExportOutcome, TabularWriter};
pub use join::{ActivityRow, InteractionRow};
pub use paginate::PageInfo;
pub use query::{
    compute_interactions, compute_summary, compute_worklist, InteractionReport, ReportQuery,
    SummaryReport, WorklistReport,
};
pub use snapshot::{ChangeBus, FetchError, Snapshot, SnapshotSource};
pub use window::{Period, TimeWindow, WindowResolution};
