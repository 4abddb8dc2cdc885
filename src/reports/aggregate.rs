use super::classify::ActivityFlags;
use serde::Serialize;
use std::collections::HashMap;

/// Per-executive summary counts for the active window. Rebuilt from
/// scratch on every refresh or window change, never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationRow {
    pub executive_name: String,
    pub total: usize,
    pub no_interaction_count: usize,
    pub no_appointment_count: usize,
    pub missed_count: usize,
}

impl AggregationRow {
    pub fn to_view(&self) -> AggregationRowView {
        AggregationRowView {
            executive_name: self.executive_name.clone(),
            total: self.total,
            no_interaction_count: self.no_interaction_count,
            no_appointment_count: self.no_appointment_count,
            missed_count: self.missed_count,
            no_interaction_ratio: format_ratio(self.no_interaction_count, self.total),
            no_appointment_ratio: format_ratio(self.no_appointment_count, self.total),
            missed_ratio: format_ratio(self.missed_count, self.total),
        }
    }
}

/// Serializable row with the ratio strings the table and export show.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AggregationRowView {
    pub executive_name: String,
    pub total: usize,
    pub no_interaction_count: usize,
    pub no_appointment_count: usize,
    pub missed_count: usize,
    pub no_interaction_ratio: String,
    pub no_appointment_ratio: String,
    pub missed_ratio: String,
}

/// Sub-filter applied to already-aggregated rows, without
/// re-aggregating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryFocus {
    #[default]
    All,
    NoInteraction,
    NoAppointment,
    Missed,
}

impl SummaryFocus {
    pub fn admits(&self, row: &AggregationRow) -> bool {
        match self {
            Self::All => true,
            Self::NoInteraction => row.no_interaction_count > 0,
            Self::NoAppointment => row.no_appointment_count > 0,
            Self::Missed => row.missed_count > 0,
        }
    }
}

/// `count / total` as a percentage with two decimals and a ` %` suffix;
/// `0.00 %` when the group is empty (never divides by zero).
pub fn format_ratio(count: usize, total: usize) -> String {
    if total == 0 {
        return "0.00 %".to_string();
    }
    format!("{:.2} %", count as f64 / total as f64 * 100.0)
}

/// Group classified leads by resolved executive name and accumulate
/// counts. One row per distinct name (the synthetic "Unassigned" bucket
/// included), sorted descending by total; the sort is stable so ties
/// keep first-seen order.
pub fn aggregate<'a, I>(classified: I) -> Vec<AggregationRow>
where
    I: IntoIterator<Item = (&'a str, ActivityFlags)>,
{
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, AggregationRow> = HashMap::new();

    for (executive_name, flags) in classified {
        let row = groups
            .entry(executive_name.to_string())
            .or_insert_with(|| {
                order.push(executive_name.to_string());
                AggregationRow {
                    executive_name: executive_name.to_string(),
                    ..AggregationRow::default()
                }
            });

        row.total += 1;
        if flags.no_interaction() {
            row.no_interaction_count += 1;
        }
        if flags.no_appointment() {
            row.no_appointment_count += 1;
        }
        if flags.missed {
            row.missed_count += 1;
        }
    }

    let mut rows: Vec<AggregationRow> = order
        .into_iter()
        .filter_map(|name| groups.remove(&name))
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows
}
