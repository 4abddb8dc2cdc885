use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Disposition of a scheduled followup. Transitions only leave `Open`;
/// once `Done` or `Cancelled` a followup no longer counts as scheduled
/// or missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowupStatus {
    Open,
    Done,
    Cancelled,
}

impl FollowupStatus {
    pub const fn ordered() -> [Self; 3] {
        [Self::Open, Self::Done, Self::Cancelled]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Done => "Done",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Lenient mapping from upstream status strings. Unknown or missing
    /// statuses are treated as open so the followup stays actionable.
    pub fn from_upstream(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "done" | "completed" | "complete" | "closed" => Self::Done,
            "cancelled" | "canceled" | "dropped" => Self::Cancelled,
            _ => Self::Open,
        }
    }
}

/// Which record date the active window tests. The modes are mutually
/// exclusive: activating one clears the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    Scheduled,
    Created,
    Transferred,
}

impl DateField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "Followup Date",
            Self::Created => "Created Date",
            Self::Transferred => "Transfer Date",
        }
    }
}

/// Reference to an assigned executive as it appears upstream: a numeric
/// id, an embedded object, or a free-text name. Resolution to a display
/// name happens against the employee directory, see `normalize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutiveRef {
    pub id: Option<String>,
    pub label: Option<String>,
}

impl ExecutiveRef {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.label.is_none()
    }
}

/// A sales prospect. The id is the join key for interactions and
/// followups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub business_name: String,
    pub contact_name: String,
    pub mobile: String,
    pub email: String,
    pub created_at: Option<NaiveDateTime>,
    pub transferred_at: Option<NaiveDateTime>,
    pub executive: ExecutiveRef,
}

impl Lead {
    pub fn created_day(&self) -> Option<NaiveDate> {
        self.created_at.map(|dt| dt.date())
    }

    pub fn transferred_day(&self) -> Option<NaiveDate> {
        self.transferred_at.map(|dt| dt.date())
    }
}

/// A logged contact event tied to exactly one lead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub lead_id: String,
    pub occurred_at: Option<NaiveDateTime>,
    pub kind: String,
    pub summary: String,
    pub note: String,
}

/// A scheduled future action tied to exactly one lead, optionally
/// assigned to an executive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Followup {
    pub id: String,
    pub lead_id: String,
    pub scheduled_at: Option<NaiveDateTime>,
    pub status: FollowupStatus,
    pub kind: String,
    pub note: String,
    pub executive: ExecutiveRef,
}

impl Default for Followup {
    fn default() -> Self {
        Self {
            id: String::new(),
            lead_id: String::new(),
            scheduled_at: None,
            status: FollowupStatus::Open,
            kind: String::new(),
            note: String::new(),
            executive: ExecutiveRef::default(),
        }
    }
}

impl Followup {
    pub fn scheduled_day(&self) -> Option<NaiveDate> {
        self.scheduled_at.map(|dt| dt.date())
    }
}

/// An employee to whom leads and followups are assigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub salutation: String,
    pub first_name: String,
    pub last_name: String,
    pub combined_name: String,
    pub username: String,
    pub email: String,
}

impl Employee {
    /// Display name, deterministically derived: pre-combined name
    /// verbatim, else salutation + first + last (trimmed,
    /// single-spaced), else username, else email, else `User <id>`.
    pub fn display_name(&self) -> String {
        if !self.combined_name.trim().is_empty() {
            return self.combined_name.trim().to_string();
        }

        let composed = [
            self.salutation.as_str(),
            self.first_name.as_str(),
            self.last_name.as_str(),
        ]
        .into_iter()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
        if !composed.is_empty() {
            return composed;
        }

        if !self.username.trim().is_empty() {
            return self.username.trim().to_string();
        }
        if !self.email.trim().is_empty() {
            return self.email.trim().to_string();
        }
        if !self.id.trim().is_empty() {
            return format!("User {}", self.id.trim());
        }

        UNASSIGNED.to_string()
    }
}

/// Bucket name for leads and followups with no resolvable executive.
pub const UNASSIGNED: &str = "Unassigned";
