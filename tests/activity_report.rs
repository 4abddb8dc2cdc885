use chrono::{NaiveDate, NaiveDateTime};
use crm_activity::reports::export::{export_summary, export_worklist, CsvTabularWriter};
use crm_activity::reports::{
    compute_interactions, compute_summary, compute_worklist, DateField, ExportOutcome, Period,
    ReportQuery, Snapshot,
};
use serde_json::json;

fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("valid datetime")
}

/// Three leads owned by one executive: L1 bare, L2 with an interaction
/// and an open followup dated yesterday, L3 with an open followup next
/// week.
fn three_lead_snapshot() -> Snapshot {
    Snapshot::from_raw(
        &json!({ "data": [
            { "id": 1, "business_name": "Acme", "executive": 4, "created_at": "2025-06-02" },
            { "LeadID": 2, "Business_Name": "Globex", "Executive": 4, "Created_At": "2025-06-04" },
            { "leadId": 3, "businessName": "Initech", "executive": 4, "createdAt": "2025-06-05" },
        ]}),
        &json!([
            { "id": 10, "lead_id": 2, "date": "2025-06-10", "summary": "pricing call" },
        ]),
        &json!([
            { "id": 20, "lead_id": 2, "followup_date": "2025-06-11", "time": "10:00", "status": "open" },
            { "id": 21, "lead_id": 3, "followup_date": "2025-06-19", "status": "open" },
        ]),
        &json!([
            { "id": 4, "salutation": "Ms.", "first_name": "Meera", "last_name": "Iyer" },
        ]),
    )
}

#[test]
fn three_lead_scenario_classifies_and_aggregates() {
    let snapshot = three_lead_snapshot();
    let now = noon(2025, 6, 12);

    let query = ReportQuery::new().with_period(Period::ThisMonth);
    let report = compute_summary(&query, &snapshot, now);

    assert_eq!(report.filtered.len(), 1);
    let row = &report.filtered[0];
    assert_eq!(row.executive_name, "Ms. Meera Iyer");
    assert_eq!(row.total, 3);
    assert_eq!(row.no_interaction_count, 1);
    assert_eq!(row.missed_count, 1);
    assert_eq!(row.no_interaction_ratio, "33.33 %");
    assert_eq!(row.missed_ratio, "33.33 %");

    let worklist = compute_worklist(&ReportQuery::new(), &snapshot, now);
    let l1 = worklist
        .filtered
        .iter()
        .find(|r| r.business_name == "Acme")
        .expect("L1 present despite having no followups");
    assert!(l1.flags.no_interaction());
    assert!(l1.flags.no_appointment());

    let l2 = worklist
        .filtered
        .iter()
        .find(|r| r.business_name == "Globex")
        .expect("L2 present");
    assert!(l2.flags.missed);
    assert!(!l2.flags.no_interaction());

    let l3 = worklist
        .filtered
        .iter()
        .find(|r| r.business_name == "Initech")
        .expect("L3 present");
    assert!(!l3.flags.no_appointment());
    assert!(!l3.flags.missed);
}

#[test]
fn classification_ignores_the_window_for_existence_checks() {
    // The interaction predates the selected month by a year; the lead
    // itself was created inside the window. The lead is counted, and
    // it still counts as engaged: the window picks leads, the flags
    // look at all-time history.
    let snapshot = Snapshot::from_raw(
        &json!([
            { "id": 1, "business_name": "Acme", "executive": "Kiran Rao", "created_at": "2025-06-02" },
        ]),
        &json!([
            { "id": 10, "lead_id": 1, "date": "2024-06-02", "summary": "old call" },
        ]),
        &json!([]),
        &json!([]),
    );

    let query = ReportQuery::new().with_period(Period::ThisMonth);
    let report = compute_summary(&query, &snapshot, noon(2025, 6, 12));

    assert_eq!(report.filtered.len(), 1);
    let row = &report.filtered[0];
    assert_eq!(row.total, 1);
    assert_eq!(row.no_interaction_count, 0, "all-time interaction counts");
}

#[test]
fn custom_month_without_selection_matches_nothing() {
    let snapshot = three_lead_snapshot();
    let query = ReportQuery::new().with_period(Period::CustomMonth {
        year: 2025,
        month: None,
    });

    let summary = compute_summary(&query, &snapshot, noon(2025, 6, 12));
    assert!(summary.filtered.is_empty());

    let worklist = compute_worklist(&query, &snapshot, noon(2025, 6, 12));
    assert!(worklist.filtered.is_empty());
    assert_eq!(worklist.page.page, 1);
    assert_eq!(worklist.page.total_pages, 1);
}

#[test]
fn financial_year_window_spans_april_to_march() {
    let snapshot = Snapshot::from_raw(
        &json!([
            { "id": 1, "business_name": "AprilLead", "created_at": "2025-04-01" },
            { "id": 2, "business_name": "MarchLead", "created_at": "2026-03-31" },
            { "id": 3, "business_name": "OutsideLead", "created_at": "2025-03-31" },
        ]),
        &json!([]),
        &json!([]),
        &json!([]),
    );

    let query = ReportQuery::new().with_period(Period::FinancialYear);
    let report = compute_worklist(&query, &snapshot, noon(2025, 6, 12));

    let names: Vec<&str> = report
        .filtered
        .iter()
        .map(|r| r.business_name.as_str())
        .collect();
    assert!(names.contains(&"AprilLead"));
    assert!(names.contains(&"MarchLead"));
    assert!(!names.contains(&"OutsideLead"));
}

#[test]
fn page_size_reduction_reclamps_instead_of_resetting() {
    let leads: Vec<serde_json::Value> = (1..=22)
        .map(|id| json!({ "id": id, "business_name": format!("Lead {id}"), "created_at": "2025-06-02" }))
        .collect();
    let snapshot = Snapshot::from_raw(&json!(leads), &json!([]), &json!([]), &json!([]));

    let query = ReportQuery::new().with_page(3).with_page_size(10);
    let report = compute_worklist(&query, &snapshot, noon(2025, 6, 12));

    assert_eq!(report.page.page, 3);
    assert_eq!(report.page.total_pages, 3);
    assert_eq!(report.rows.len(), 2);
}

#[test]
fn worklist_date_modes_are_mutually_exclusive() {
    let snapshot = three_lead_snapshot();
    let now = noon(2025, 6, 12);

    // Followup-date mode for this week admits only the June 11 pair.
    let by_schedule = ReportQuery::new()
        .with_period(Period::ThisWeek)
        .with_date_field(DateField::Scheduled);
    let report = compute_worklist(&by_schedule, &snapshot, now);
    assert_eq!(report.filtered.len(), 1);
    assert_eq!(report.filtered[0].business_name, "Globex");

    // Switching to creation-date mode replaces the previous mode
    // entirely; all three leads were created that week... only leads
    // created June 8-14 qualify.
    let by_creation = by_schedule.with_date_field(DateField::Created);
    assert_eq!(by_creation.date_field, DateField::Created);
    let report = compute_worklist(&by_creation, &snapshot, now);
    assert!(report.filtered.is_empty(), "no lead created June 8-14");
}

#[test]
fn export_uses_the_full_filtered_set_not_the_page() {
    let snapshot = three_lead_snapshot();
    let query = ReportQuery::new().with_page_size(1);
    let report = compute_worklist(&query, &snapshot, noon(2025, 6, 12));
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.filtered.len(), 3);

    let mut buffer = Vec::new();
    let outcome = export_worklist(&report.filtered, &mut CsvTabularWriter::new(&mut buffer))
        .expect("export succeeds");
    assert_eq!(outcome, ExportOutcome::Written { rows: 3 });

    let text = String::from_utf8(buffer).expect("utf8 csv");
    // Header plus one line per filtered row, not per page row.
    assert_eq!(text.lines().count(), 4);
}

#[test]
fn empty_filter_result_reports_nothing_to_export() {
    let snapshot = three_lead_snapshot();
    let query = ReportQuery::new().with_search("no such business");
    let report = compute_summary(&query, &snapshot, noon(2025, 6, 12));

    let mut writer = CsvTabularWriter::new(Vec::new());
    let outcome = export_summary(&report.filtered, &mut writer).expect("no-op export");
    assert_eq!(outcome, ExportOutcome::NothingToExport);
}

#[test]
fn interaction_log_searches_over_derived_fields() {
    let snapshot = three_lead_snapshot();
    let now = noon(2025, 6, 12);

    // Term matches the joined lead's business name, not the
    // interaction record itself.
    let query = ReportQuery::new().with_search("globex");
    let report = compute_interactions(&query, &snapshot, now);
    assert_eq!(report.filtered.len(), 1);
    assert_eq!(report.filtered[0].summary, "pricing call");

    // Formatted date is searchable too.
    let query = ReportQuery::new().with_search("10-06-2025");
    let report = compute_interactions(&query, &snapshot, now);
    assert_eq!(report.filtered.len(), 1);
}

#[test]
fn malformed_and_partial_payloads_degrade_quietly() {
    let snapshot = Snapshot::from_raw(
        &json!({ "data": [
            { "business_name": "No Id Lead" },
            "not even an object",
            { "id": 2, "business_name": "Valid", "created_at": "not a date" },
        ]}),
        &json!("bogus"),
        &json!(null),
        &json!([]),
    );

    assert_eq!(snapshot.leads.len(), 3);
    assert!(snapshot.interactions.is_empty());
    assert!(snapshot.followups.is_empty());

    let report = compute_summary(&ReportQuery::new(), &snapshot, noon(2025, 6, 12));
    // Every lead lands in the Unassigned bucket; nothing panics.
    assert_eq!(report.filtered.len(), 1);
    assert_eq!(report.filtered[0].executive_name, "Unassigned");
    assert_eq!(report.filtered[0].total, 3);
}
