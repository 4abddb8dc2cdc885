//! Serializes a filtered, classified, sorted view to a tabular file.
//!
//! The exporter always works on the full filtered set, never the
//! current page. An empty set is a reported no-op rather than an empty
//! file.

use super::aggregate::AggregationRowView;
use super::join::{ActivityRow, InteractionRow};
use super::window::Period;
use chrono::{NaiveDate, NaiveDateTime};
use std::io::Write;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Generic tabular-file collaborator. The engine prepares labeled rows;
/// what container they land in (CSV today) is the writer's concern.
pub trait TabularWriter {
    fn write_table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> Result<(), ExportError>;
}

/// CSV-backed writer over any `io::Write`.
pub struct CsvTabularWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> CsvTabularWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: csv::Writer::from_writer(writer),
        }
    }
}

impl<W: Write> TabularWriter for CsvTabularWriter<W> {
    fn write_table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> Result<(), ExportError> {
        self.inner.write_record(headers)?;
        for row in rows {
            self.inner.write_record(row)?;
        }
        self.inner.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { rows: usize },
    /// The filtered set was empty; nothing was handed to the writer.
    NothingToExport,
}

/// `<report-name>_<period>_<ISO-date>.csv`
pub fn export_file_name(report_name: &str, period: Period, today: NaiveDate) -> String {
    format!("{report_name}_{}_{today}.csv", period.slug())
}

/// `dd-mm-yyyy`, or empty for an absent date.
pub fn format_day(value: Option<NaiveDateTime>) -> String {
    value
        .map(|dt| dt.format("%d-%m-%Y").to_string())
        .unwrap_or_default()
}

const WORKLIST_HEADERS: &[&str] = &[
    "Business Name",
    "Contact",
    "Mobile",
    "Email",
    "Executive",
    "Followup Date",
    "Followup Status",
    "Followup Type",
    "Note",
    "Last Interaction",
    "Created On",
];

pub fn export_worklist<W: TabularWriter>(
    rows: &[ActivityRow],
    writer: &mut W,
) -> Result<ExportOutcome, ExportError> {
    if rows.is_empty() {
        return Ok(ExportOutcome::NothingToExport);
    }

    let records: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.business_name.clone(),
                row.contact_name.clone(),
                row.mobile.clone(),
                row.email.clone(),
                row.executive_name.clone(),
                format_day(row.scheduled_at),
                row.followup_status
                    .map(|status| status.label().to_string())
                    .unwrap_or_default(),
                row.followup_kind.clone(),
                row.followup_note.clone(),
                format_day(row.last_interaction_at),
                format_day(row.created_at),
            ]
        })
        .collect();

    writer.write_table(WORKLIST_HEADERS, &records)?;
    Ok(ExportOutcome::Written { rows: records.len() })
}

const SUMMARY_HEADERS: &[&str] = &[
    "Executive",
    "Total Leads",
    "No Interaction",
    "No Interaction %",
    "No Appointment",
    "No Appointment %",
    "Missed Followups",
    "Missed %",
];

pub fn export_summary<W: TabularWriter>(
    rows: &[AggregationRowView],
    writer: &mut W,
) -> Result<ExportOutcome, ExportError> {
    if rows.is_empty() {
        return Ok(ExportOutcome::NothingToExport);
    }

    let records: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.executive_name.clone(),
                row.total.to_string(),
                row.no_interaction_count.to_string(),
                row.no_interaction_ratio.clone(),
                row.no_appointment_count.to_string(),
                row.no_appointment_ratio.clone(),
                row.missed_count.to_string(),
                row.missed_ratio.clone(),
            ]
        })
        .collect();

    writer.write_table(SUMMARY_HEADERS, &records)?;
    Ok(ExportOutcome::Written { rows: records.len() })
}

const INTERACTION_HEADERS: &[&str] = &[
    "Date",
    "Business Name",
    "Contact",
    "Mobile",
    "Executive",
    "Type",
    "Summary",
    "Note",
];

pub fn export_interactions<W: TabularWriter>(
    rows: &[InteractionRow],
    writer: &mut W,
) -> Result<ExportOutcome, ExportError> {
    if rows.is_empty() {
        return Ok(ExportOutcome::NothingToExport);
    }

    let records: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                format_day(row.occurred_at),
                row.business_name.clone(),
                row.contact_name.clone(),
                row.mobile.clone(),
                row.executive_name.clone(),
                row.kind.clone(),
                row.summary.clone(),
                row.note.clone(),
            ]
        })
        .collect();

    writer.write_table(INTERACTION_HEADERS, &records)?;
    Ok(ExportOutcome::Written { rows: records.len() })
}
