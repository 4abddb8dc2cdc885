//! Joins the four normalized collections into denormalized view rows.

use super::classify::{classify, ActivityFlags};
use super::domain::{DateField, Followup, FollowupStatus, Interaction, Lead, UNASSIGNED};
use super::normalize::resolve_executive;
use super::snapshot::Snapshot;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;

/// One lead with everything attached: its interactions, its followups,
/// the most recent interaction, and the classification flags.
#[derive(Debug)]
pub struct LeadActivity<'a> {
    pub lead: &'a Lead,
    pub interactions: Vec<&'a Interaction>,
    pub followups: Vec<&'a Followup>,
    pub latest_interaction: Option<&'a Interaction>,
    pub executive_name: String,
    pub flags: ActivityFlags,
}

/// Flat worklist row, one per lead-followup pair. A lead with no
/// followups still yields exactly one row so it can be counted and
/// worked as "no interaction".
#[derive(Debug, Clone, Serialize)]
pub struct ActivityRow {
    pub lead_id: String,
    pub business_name: String,
    pub contact_name: String,
    pub mobile: String,
    pub email: String,
    pub executive_name: String,
    pub followup_id: Option<String>,
    pub scheduled_at: Option<NaiveDateTime>,
    pub followup_status: Option<FollowupStatus>,
    pub followup_kind: String,
    pub followup_note: String,
    pub last_interaction_at: Option<NaiveDateTime>,
    pub last_interaction_summary: String,
    pub created_at: Option<NaiveDateTime>,
    pub transferred_at: Option<NaiveDateTime>,
    pub flags: ActivityFlags,
}

impl ActivityRow {
    /// The date the active window tests, depending on which date-filter
    /// mode is active.
    pub fn governing_date(&self, field: DateField) -> Option<NaiveDate> {
        match field {
            DateField::Scheduled => self.scheduled_at.map(|dt| dt.date()),
            DateField::Created => self.created_at.map(|dt| dt.date()),
            DateField::Transferred => self.transferred_at.map(|dt| dt.date()),
        }
    }
}

/// Interaction log row: one per interaction, denormalized with its
/// lead's display fields.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionRow {
    pub interaction_id: String,
    pub lead_id: String,
    pub business_name: String,
    pub contact_name: String,
    pub mobile: String,
    pub executive_name: String,
    pub occurred_at: Option<NaiveDateTime>,
    pub kind: String,
    pub summary: String,
    pub note: String,
}

/// Attach interactions, followups, the latest interaction, and the
/// resolved executive to every lead. Runs once per recomputation; the
/// output feeds both the worklist and the aggregation.
pub fn join_leads<'a>(snapshot: &'a Snapshot, now: NaiveDateTime) -> Vec<LeadActivity<'a>> {
    let directory = snapshot.directory();

    let mut interactions_by_lead: HashMap<&str, Vec<&Interaction>> = HashMap::new();
    for interaction in &snapshot.interactions {
        interactions_by_lead
            .entry(interaction.lead_id.as_str())
            .or_default()
            .push(interaction);
    }

    let mut followups_by_lead: HashMap<&str, Vec<&Followup>> = HashMap::new();
    for followup in &snapshot.followups {
        followups_by_lead
            .entry(followup.lead_id.as_str())
            .or_default()
            .push(followup);
    }

    snapshot
        .leads
        .iter()
        .map(|lead| {
            let interactions = interactions_by_lead
                .get(lead.id.as_str())
                .cloned()
                .unwrap_or_default();
            let followups = followups_by_lead
                .get(lead.id.as_str())
                .cloned()
                .unwrap_or_default();

            let latest_interaction = latest_of(&interactions);
            let flags = classify(&interactions, &followups, now);
            let executive_name = if lead.executive.is_empty() {
                UNASSIGNED.to_string()
            } else {
                resolve_executive(&lead.executive, &directory)
            };

            LeadActivity {
                lead,
                interactions,
                followups,
                latest_interaction,
                executive_name,
                flags,
            }
        })
        .collect()
}

/// Explode joined leads into one worklist row per lead-followup pair.
/// The executive on a followup row is resolved from the followup's own
/// reference first, falling back to the lead's.
pub fn activity_rows(snapshot: &Snapshot, activities: &[LeadActivity<'_>]) -> Vec<ActivityRow> {
    let directory = snapshot.directory();
    let mut rows = Vec::new();

    for activity in activities {
        if activity.followups.is_empty() {
            rows.push(base_row(activity, None, activity.executive_name.clone()));
            continue;
        }

        for followup in &activity.followups {
            let executive_name = if followup.executive.is_empty() {
                activity.executive_name.clone()
            } else {
                resolve_executive(&followup.executive, &directory)
            };
            rows.push(base_row(activity, Some(followup), executive_name));
        }
    }

    rows
}

/// Interaction log rows, most recent first. Interactions that reference
/// an unknown lead still appear, with empty lead fields.
pub fn interaction_rows(snapshot: &Snapshot, activities: &[LeadActivity<'_>]) -> Vec<InteractionRow> {
    let leads_by_id: HashMap<&str, &LeadActivity<'_>> = activities
        .iter()
        .map(|activity| (activity.lead.id.as_str(), activity))
        .collect();

    let mut rows: Vec<InteractionRow> = snapshot
        .interactions
        .iter()
        .map(|interaction| {
            let activity = leads_by_id.get(interaction.lead_id.as_str());
            InteractionRow {
                interaction_id: interaction.id.clone(),
                lead_id: interaction.lead_id.clone(),
                business_name: activity
                    .map(|a| a.lead.business_name.clone())
                    .unwrap_or_default(),
                contact_name: activity
                    .map(|a| a.lead.contact_name.clone())
                    .unwrap_or_default(),
                mobile: activity.map(|a| a.lead.mobile.clone()).unwrap_or_default(),
                executive_name: activity
                    .map(|a| a.executive_name.clone())
                    .unwrap_or_else(|| UNASSIGNED.to_string()),
                occurred_at: interaction.occurred_at,
                kind: interaction.kind.clone(),
                summary: interaction.summary.clone(),
                note: interaction.note.clone(),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    rows
}

/// Max by timestamp; on equal timestamps the later record in iteration
/// order wins.
fn latest_of<'a>(interactions: &[&'a Interaction]) -> Option<&'a Interaction> {
    let mut latest: Option<&Interaction> = None;
    for interaction in interactions {
        match latest {
            Some(current) if interaction.occurred_at < current.occurred_at => {}
            _ => latest = Some(interaction),
        }
    }
    latest
}

fn base_row(
    activity: &LeadActivity<'_>,
    followup: Option<&Followup>,
    executive_name: String,
) -> ActivityRow {
    ActivityRow {
        lead_id: activity.lead.id.clone(),
        business_name: activity.lead.business_name.clone(),
        contact_name: activity.lead.contact_name.clone(),
        mobile: activity.lead.mobile.clone(),
        email: activity.lead.email.clone(),
        executive_name,
        followup_id: followup.map(|f| f.id.clone()),
        scheduled_at: followup.and_then(|f| f.scheduled_at),
        followup_status: followup.map(|f| f.status),
        followup_kind: followup.map(|f| f.kind.clone()).unwrap_or_default(),
        followup_note: followup.map(|f| f.note.clone()).unwrap_or_default(),
        last_interaction_at: activity.latest_interaction.and_then(|i| i.occurred_at),
        last_interaction_summary: activity
            .latest_interaction
            .map(|i| i.summary.clone())
            .unwrap_or_default(),
        created_at: activity.lead.created_at,
        transferred_at: activity.lead.transferred_at,
        flags: activity.flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_snapshot() -> Snapshot {
        Snapshot::from_raw(
            &json!([
                { "id": 1, "business_name": "Acme", "executive": 4, "created_at": "2025-06-01" },
                { "id": 2, "business_name": "Globex" },
            ]),
            &json!([
                { "id": 10, "lead_id": 1, "date": "2025-06-02", "summary": "intro call" },
                { "id": 11, "lead_id": 1, "date": "2025-06-05", "summary": "site visit" },
                { "id": 12, "lead_id": 1, "date": "2025-06-05", "summary": "revised quote" },
            ]),
            &json!([
                { "id": 20, "lead_id": 1, "followup_date": "2025-06-10", "executive": 5 },
                { "id": 21, "lead_id": 1, "followup_date": "2025-06-20" },
            ]),
            &json!([
                { "id": 4, "first_name": "Meera", "last_name": "Iyer" },
                { "id": 5, "first_name": "Ravi", "last_name": "Sharma" },
            ]),
        )
    }

    fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("valid datetime")
    }

    #[test]
    fn latest_interaction_breaks_ties_toward_later_record() {
        let snapshot = sample_snapshot();
        let activities = join_leads(&snapshot, noon(2025, 6, 12));

        let acme = activities
            .iter()
            .find(|a| a.lead.id == "1")
            .expect("lead joined");
        let latest = acme.latest_interaction.expect("has interactions");
        assert_eq!(latest.summary, "revised quote");
    }

    #[test]
    fn lead_without_followups_still_yields_one_row() {
        let snapshot = sample_snapshot();
        let activities = join_leads(&snapshot, noon(2025, 6, 12));
        let rows = activity_rows(&snapshot, &activities);

        let globex: Vec<_> = rows.iter().filter(|r| r.lead_id == "2").collect();
        assert_eq!(globex.len(), 1);
        assert!(globex[0].followup_id.is_none());
        assert!(globex[0].flags.no_interaction());
        assert_eq!(globex[0].executive_name, "Unassigned");
    }

    #[test]
    fn followup_executive_overrides_lead_executive() {
        let snapshot = sample_snapshot();
        let activities = join_leads(&snapshot, noon(2025, 6, 12));
        let rows = activity_rows(&snapshot, &activities);

        let with_own_exec = rows
            .iter()
            .find(|r| r.followup_id.as_deref() == Some("20"))
            .expect("row for followup 20");
        assert_eq!(with_own_exec.executive_name, "Ravi Sharma");

        let inherited = rows
            .iter()
            .find(|r| r.followup_id.as_deref() == Some("21"))
            .expect("row for followup 21");
        assert_eq!(inherited.executive_name, "Meera Iyer");
    }

    #[test]
    fn governing_date_tracks_the_active_mode() {
        let snapshot = sample_snapshot();
        let activities = join_leads(&snapshot, noon(2025, 6, 12));
        let rows = activity_rows(&snapshot, &activities);

        let row = rows
            .iter()
            .find(|r| r.followup_id.as_deref() == Some("20"))
            .expect("row");
        assert_eq!(
            row.governing_date(DateField::Scheduled),
            chrono::NaiveDate::from_ymd_opt(2025, 6, 10)
        );
        assert_eq!(
            row.governing_date(DateField::Created),
            chrono::NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        assert_eq!(row.governing_date(DateField::Transferred), None);
    }

    #[test]
    fn interaction_rows_sort_newest_first_and_keep_orphans() {
        let snapshot = Snapshot::from_raw(
            &json!([{ "id": 1, "business_name": "Acme" }]),
            &json!([
                { "id": 10, "lead_id": 1, "date": "2025-06-02" },
                { "id": 11, "lead_id": 99, "date": "2025-06-09" },
            ]),
            &json!([]),
            &json!([]),
        );
        let activities = join_leads(&snapshot, noon(2025, 6, 12));
        let rows = interaction_rows(&snapshot, &activities);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].interaction_id, "11");
        assert!(rows[0].business_name.is_empty());
        assert_eq!(rows[0].executive_name, "Unassigned");
        assert_eq!(rows[1].business_name, "Acme");
    }
}
