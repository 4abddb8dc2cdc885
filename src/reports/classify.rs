use super::domain::{Followup, FollowupStatus, Interaction};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Activity flags for one lead. The existence checks are deliberately
/// all-time, not window-filtered: an interaction logged last year still
/// counts as engagement even when the report window is this month. The
/// window decides which leads appear; these flags look at full history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityFlags {
    pub has_interaction: bool,
    pub has_scheduled_followup: bool,
    pub missed: bool,
}

impl ActivityFlags {
    /// A lead is "no interaction" only when it has neither a logged
    /// interaction nor a scheduled followup; a booked appointment is
    /// taken as evidence of engagement on its own.
    pub fn no_interaction(&self) -> bool {
        !self.has_interaction && !self.has_scheduled_followup
    }

    pub fn no_appointment(&self) -> bool {
        !self.has_scheduled_followup
    }
}

/// Classify one lead from its attached interactions and followups.
/// `now` is wall-clock at evaluation time, not the window end; the
/// missed check is the one place time-of-day matters.
pub fn classify(
    interactions: &[&Interaction],
    followups: &[&Followup],
    now: NaiveDateTime,
) -> ActivityFlags {
    let has_interaction = !interactions.is_empty();

    let mut has_scheduled_followup = false;
    let mut missed = false;
    for followup in followups {
        if followup.status != FollowupStatus::Open {
            continue;
        }
        let Some(scheduled_at) = followup.scheduled_at else {
            continue;
        };
        has_scheduled_followup = true;
        if scheduled_at < now {
            missed = true;
        }
    }

    ActivityFlags {
        has_interaction,
        has_scheduled_followup,
        missed,
    }
}
