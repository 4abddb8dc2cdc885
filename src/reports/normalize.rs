//! Canonicalisation of heterogeneous upstream records.
//!
//! The backend of record is not consistent about field names or casing:
//! a lead reference may arrive as `lead_id`, `LeadID`, `leadId`, or a
//! nested `lead.id`. Every accessor here is table-driven over an
//! enumerated synonym list, never raises, and coerces missing values to
//! empty strings or `None`.

use super::domain::{Employee, ExecutiveRef, Followup, FollowupStatus, Interaction, Lead};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use std::collections::HashMap;

const LEAD_ID: &[&str] = &["id", "leadid", "lead.id"];
const LEAD_BUSINESS: &[&str] = &["businessname", "business", "companyname", "company", "firm"];
const LEAD_CONTACT: &[&str] = &["contactname", "contactperson", "name", "personname"];
const LEAD_MOBILE: &[&str] = &["mobile", "mobileno", "phone", "phoneno", "contactno"];
const LEAD_EMAIL: &[&str] = &["email", "emailid", "mail"];
const LEAD_CREATED: &[&str] = &["createdat", "createddate", "creationdate", "entrydate"];
const LEAD_TRANSFERRED: &[&str] = &["transferredat", "transferdate", "transferreddate"];

const INTERACTION_ID: &[&str] = &["id", "interactionid"];
const INTERACTION_LEAD: &[&str] = &["leadid", "lead.id", "lead"];
const INTERACTION_AT: &[&str] = &["occurredat", "interactiondate", "date", "timestamp", "createdat"];
const INTERACTION_TIME: &[&str] = &["time", "interactiontime"];
const INTERACTION_KIND: &[&str] = &["type", "interactiontype", "mode"];
const INTERACTION_SUMMARY: &[&str] = &["summary", "subject", "title"];
const INTERACTION_NOTE: &[&str] = &["note", "notes", "remark", "remarks", "description"];

const FOLLOWUP_ID: &[&str] = &["id", "followupid"];
const FOLLOWUP_LEAD: &[&str] = &["leadid", "lead.id", "lead"];
const FOLLOWUP_AT: &[&str] = &["scheduledat", "followupdate", "nextfollowupdate", "date"];
const FOLLOWUP_TIME: &[&str] = &["time", "followuptime"];
const FOLLOWUP_STATUS: &[&str] = &["status", "followupstatus", "state"];
const FOLLOWUP_KIND: &[&str] = &["type", "followuptype", "mode"];
const FOLLOWUP_NOTE: &[&str] = &["note", "notes", "remark", "remarks", "description"];

const EMPLOYEE_ID: &[&str] = &["id", "employeeid", "userid"];
const EMPLOYEE_SALUTATION: &[&str] = &["salutation", "title"];
const EMPLOYEE_FIRST: &[&str] = &["firstname", "fname"];
const EMPLOYEE_LAST: &[&str] = &["lastname", "lname", "surname"];
const EMPLOYEE_COMBINED: &[&str] = &["displayname", "fullname", "name", "employeename"];
const EMPLOYEE_USERNAME: &[&str] = &["username", "login"];
const EMPLOYEE_EMAIL: &[&str] = &["email", "emailid", "mail"];

const EXEC_REF: &[&str] = &[
    "executive",
    "executiveid",
    "assignedto",
    "assignedexecutive",
    "salesexecutive",
    "employee",
    "employeeid",
    "userid",
];
const EXEC_NAME: &[&str] = &["executivename", "assignedtoname", "employeename", "exec"];

/// Accepts either a bare array or an `{ "data": [...] }` envelope.
/// Anything else normalises to an empty collection.
pub fn unwrap_collection(value: &Value) -> &[Value] {
    if let Some(items) = value.as_array() {
        return items;
    }
    if let Some(items) = value.get("data").and_then(Value::as_array) {
        return items;
    }
    &[]
}

pub fn normalize_lead(raw: &Value) -> Lead {
    Lead {
        id: field_str(raw, LEAD_ID),
        business_name: field_str(raw, LEAD_BUSINESS),
        contact_name: field_str(raw, LEAD_CONTACT),
        mobile: field_str(raw, LEAD_MOBILE),
        email: field_str(raw, LEAD_EMAIL),
        created_at: field_datetime(raw, LEAD_CREATED, &[]),
        transferred_at: field_datetime(raw, LEAD_TRANSFERRED, &[]),
        executive: executive_ref(raw),
    }
}

pub fn normalize_interaction(raw: &Value) -> Interaction {
    Interaction {
        id: field_str(raw, INTERACTION_ID),
        lead_id: field_str(raw, INTERACTION_LEAD),
        occurred_at: field_datetime(raw, INTERACTION_AT, INTERACTION_TIME),
        kind: field_str(raw, INTERACTION_KIND),
        summary: field_str(raw, INTERACTION_SUMMARY),
        note: field_str(raw, INTERACTION_NOTE),
    }
}

pub fn normalize_followup(raw: &Value) -> Followup {
    Followup {
        id: field_str(raw, FOLLOWUP_ID),
        lead_id: field_str(raw, FOLLOWUP_LEAD),
        scheduled_at: field_datetime(raw, FOLLOWUP_AT, FOLLOWUP_TIME),
        status: FollowupStatus::from_upstream(&field_str(raw, FOLLOWUP_STATUS)),
        kind: field_str(raw, FOLLOWUP_KIND),
        note: field_str(raw, FOLLOWUP_NOTE),
        executive: executive_ref(raw),
    }
}

pub fn normalize_employee(raw: &Value) -> Employee {
    Employee {
        id: field_str(raw, EMPLOYEE_ID),
        salutation: field_str(raw, EMPLOYEE_SALUTATION),
        first_name: field_str(raw, EMPLOYEE_FIRST),
        last_name: field_str(raw, EMPLOYEE_LAST),
        combined_name: field_str(raw, EMPLOYEE_COMBINED),
        username: field_str(raw, EMPLOYEE_USERNAME),
        email: field_str(raw, EMPLOYEE_EMAIL),
    }
}

/// Resolve an executive reference against the employee directory.
/// Order: explicit non-numeric label verbatim, then directory lookup by
/// id, then `User <id>` for an unknown id, then `Unassigned`.
pub fn resolve_executive(
    reference: &ExecutiveRef,
    directory: &HashMap<String, Employee>,
) -> String {
    if let Some(label) = reference.label.as_deref() {
        let label = label.trim();
        if !label.is_empty() {
            return label.to_string();
        }
    }

    if let Some(id) = reference.id.as_deref() {
        let id = id.trim();
        if !id.is_empty() {
            return match directory.get(id) {
                Some(employee) => employee.display_name(),
                None => format!("User {id}"),
            };
        }
    }

    super::domain::UNASSIGNED.to_string()
}

fn executive_ref(raw: &Value) -> ExecutiveRef {
    // An explicit name field wins; otherwise the reference field may be
    // a number, a free-text name, or an embedded employee object.
    let named = non_empty(field_str(raw, EXEC_NAME));
    if named.is_some() {
        return ExecutiveRef {
            id: non_empty(field_str(raw, EXEC_REF)),
            label: named,
        };
    }

    match lookup(raw, EXEC_REF) {
        Some(Value::Object(_)) => {
            let embedded = lookup(raw, EXEC_REF).map(normalize_employee);
            ExecutiveRef {
                id: embedded.as_ref().map(|e| e.id.clone()).and_then(non_empty),
                label: embedded.map(|e| e.display_name()).and_then(non_empty),
            }
        }
        Some(value) => {
            let text = scalar_string(value);
            if text.is_empty() {
                ExecutiveRef::default()
            } else if looks_numeric(&text) {
                ExecutiveRef {
                    id: Some(text),
                    label: None,
                }
            } else {
                ExecutiveRef {
                    id: None,
                    label: Some(text),
                }
            }
        }
        None => ExecutiveRef::default(),
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn looks_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Case- and separator-insensitive key lookup: `LeadID`, `lead_id`, and
/// `leadId` all fold to `leadid`. Synonyms containing a dot descend into
/// nested objects (`lead.id`).
fn lookup<'a>(raw: &'a Value, synonyms: &[&str]) -> Option<&'a Value> {
    let object = raw.as_object()?;
    for synonym in synonyms {
        let found = match synonym.split_once('.') {
            Some((head, tail)) => object
                .iter()
                .find(|(key, _)| fold_key(key) == *head)
                .and_then(|(_, nested)| lookup(nested, &[tail])),
            None => object
                .iter()
                .find(|(key, _)| fold_key(key) == *synonym)
                .map(|(_, value)| value),
        };
        if let Some(value) = found {
            if !value.is_null() {
                return Some(value);
            }
        }
    }
    None
}

fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-' && *c != ' ')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn field_str(raw: &Value, synonyms: &[&str]) -> String {
    lookup(raw, synonyms).map(scalar_string).unwrap_or_default()
}

/// Date (plus optional separate time field) to a `NaiveDateTime`.
/// A date-only value lands at midnight.
fn field_datetime(raw: &Value, date_synonyms: &[&str], time_synonyms: &[&str]) -> Option<NaiveDateTime> {
    let date_text = field_str(raw, date_synonyms);
    let parsed = parse_datetime(&date_text)?;

    if !time_synonyms.is_empty() {
        let time_text = field_str(raw, time_synonyms);
        if let Some(time) = parse_time(&time_text) {
            return Some(parsed.date().and_time(time));
        }
    }

    Some(parsed)
}

pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%d-%m-%Y %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    for format in ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in ["%H:%M:%S", "%H:%M", "%I:%M %p"] {
        if let Ok(time) = NaiveTime::parse_from_str(trimmed, format) {
            return Some(time);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_envelopes_and_bare_arrays() {
        let envelope = json!({ "data": [{ "id": 1 }] });
        assert_eq!(unwrap_collection(&envelope).len(), 1);

        let bare = json!([{ "id": 1 }, { "id": 2 }]);
        assert_eq!(unwrap_collection(&bare).len(), 2);

        assert!(unwrap_collection(&json!({ "rows": [] })).is_empty());
        assert!(unwrap_collection(&json!(null)).is_empty());
    }

    #[test]
    fn lead_fields_tolerate_casing_and_nesting() {
        let raw = json!({
            "LeadID": 17,
            "Business_Name": "Acme Traders",
            "contactName": "Asha",
            "MOBILE": "9876500000",
            "created_date": "2025-06-12",
        });
        let lead = normalize_lead(&raw);
        assert_eq!(lead.id, "17");
        assert_eq!(lead.business_name, "Acme Traders");
        assert_eq!(lead.contact_name, "Asha");
        assert_eq!(lead.mobile, "9876500000");
        assert_eq!(
            lead.created_day(),
            NaiveDate::from_ymd_opt(2025, 6, 12)
        );

        let nested = json!({ "lead": { "Id": "9" }, "note": "call" });
        let interaction = normalize_interaction(&nested);
        assert_eq!(interaction.lead_id, "9");
        assert_eq!(interaction.note, "call");
    }

    #[test]
    fn missing_fields_never_panic() {
        let lead = normalize_lead(&json!({}));
        assert!(lead.id.is_empty());
        assert!(lead.created_at.is_none());
        assert!(lead.executive.is_empty());

        let lead = normalize_lead(&json!("not an object"));
        assert!(lead.id.is_empty());
    }

    #[test]
    fn executive_reference_variants() {
        let numeric = normalize_lead(&json!({ "id": 1, "executive": 12 }));
        assert_eq!(numeric.executive.id.as_deref(), Some("12"));
        assert!(numeric.executive.label.is_none());

        let named = normalize_lead(&json!({ "id": 1, "assigned_to": "Kiran Rao" }));
        assert_eq!(named.executive.label.as_deref(), Some("Kiran Rao"));

        let embedded = normalize_lead(&json!({
            "id": 1,
            "executive": { "id": 4, "first_name": "Meera", "last_name": "Iyer" }
        }));
        assert_eq!(embedded.executive.id.as_deref(), Some("4"));
        assert_eq!(embedded.executive.label.as_deref(), Some("Meera Iyer"));
    }

    #[test]
    fn resolve_executive_fallback_chain() {
        let mut directory = HashMap::new();
        directory.insert(
            "4".to_string(),
            Employee {
                id: "4".into(),
                first_name: "Meera".into(),
                last_name: "Iyer".into(),
                ..Employee::default()
            },
        );

        let by_label = ExecutiveRef {
            id: Some("4".into()),
            label: Some("Custom Label".into()),
        };
        assert_eq!(resolve_executive(&by_label, &directory), "Custom Label");

        let by_id = ExecutiveRef {
            id: Some("4".into()),
            label: None,
        };
        assert_eq!(resolve_executive(&by_id, &directory), "Meera Iyer");

        let unknown = ExecutiveRef {
            id: Some("99".into()),
            label: None,
        };
        assert_eq!(resolve_executive(&unknown, &directory), "User 99");

        assert_eq!(
            resolve_executive(&ExecutiveRef::default(), &directory),
            "Unassigned"
        );
    }

    #[test]
    fn datetime_parsing_accepts_common_shapes() {
        assert_eq!(
            parse_datetime("2025-06-12T09:30:00Z"),
            NaiveDate::from_ymd_opt(2025, 6, 12).and_then(|d| d.and_hms_opt(9, 30, 0))
        );
        assert_eq!(
            parse_datetime("12-06-2025"),
            NaiveDate::from_ymd_opt(2025, 6, 12).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert!(parse_datetime("  ").is_none());
        assert!(parse_datetime("soon").is_none());
    }

    #[test]
    fn separate_date_and_time_fields_combine() {
        let raw = json!({
            "id": 1,
            "followup_date": "2025-06-12",
            "followup_time": "14:30",
        });
        let followup = normalize_followup(&raw);
        assert_eq!(
            followup.scheduled_at,
            NaiveDate::from_ymd_opt(2025, 6, 12).and_then(|d| d.and_hms_opt(14, 30, 0))
        );
    }
}
