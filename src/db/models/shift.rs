use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::AppResult;

// ============================================================================
// Shift Models
// ============================================================================

pub const ROSTER_ROLE_VOLUNTEER: &str = "volunteer";

/// One entry of a shift roster (`claimed_by`). Embedded in the shift document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedVolunteer {
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl ClaimedVolunteer {
    pub fn volunteer(uid: &str, first_name: &str, last_name: &str) -> Self {
        ClaimedVolunteer {
            uid: uid.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role: ROSTER_ROLE_VOLUNTEER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: String,
    pub event: String,
    /// Day of the shift (YYYY-MM-DD)
    pub date: String,
    /// Label matched against availability slots by the scheduler (e.g. "9am-5pm")
    pub time_label: String,
    pub start_time: String,
    pub end_time: String,
    pub floor: String,
    pub role: String,
    pub volunteers_needed: i64,
    pub overage_buffer: i64,
    /// `volunteers_needed + overage_buffer`, fixed at creation
    pub max_signups: i64,
    pub team_leads_needed: i64,
    pub notes: String,
    pub claimed_by: Vec<ClaimedVolunteer>,
    pub team_lead_uid: Option<String>,
    /// Bumped on every roster write; appends are conditional on it.
    pub version: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Shift {
    pub fn from_row(r: &SqliteRow) -> AppResult<Self> {
        let claimed_by: String = r.try_get("claimed_by")?;
        Ok(Shift {
            id: r.try_get("id")?,
            event: r.try_get("event")?,
            date: r.try_get("date")?,
            time_label: r.try_get("time_label")?,
            start_time: r.try_get("start_time")?,
            end_time: r.try_get("end_time")?,
            floor: r.try_get("floor")?,
            role: r.try_get("role")?,
            volunteers_needed: r.try_get("volunteers_needed")?,
            overage_buffer: r.try_get("overage_buffer")?,
            max_signups: r.try_get("max_signups")?,
            team_leads_needed: r.try_get("team_leads_needed")?,
            notes: r.try_get("notes")?,
            claimed_by: serde_json::from_str(&claimed_by)?,
            team_lead_uid: r.try_get("team_lead_uid")?,
            version: r.try_get("version")?,
            created_at: r.try_get("created_at")?,
            updated_at: r.try_get("updated_at")?,
        })
    }

    pub fn has_volunteer(&self, uid: &str) -> bool {
        self.claimed_by.iter().any(|v| v.uid == uid)
    }

    /// Roster size at which the shift stops accepting claims.
    ///
    /// The overage buffer is counted twice (once inside `max_signups`); the
    /// claim screens have always computed fullness this way.
    pub fn claim_capacity(&self) -> i64 {
        self.max_signups + self.overage_buffer
    }

    pub fn is_full(&self) -> bool {
        self.claimed_by.len() as i64 >= self.claim_capacity()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShift {
    pub event: String,
    pub date: String,
    /// Defaults to "{start_time} - {end_time}" when omitted
    pub time_label: Option<String>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub floor: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub volunteers_needed: i64,
    #[serde(default)]
    pub overage_buffer: i64,
    #[serde(default)]
    pub team_leads_needed: i64,
    #[serde(default)]
    pub notes: String,
}

/// Result of a guarded roster append.
#[derive(Debug, Clone)]
pub struct RosterAppend {
    /// Entries that were actually written (already-present uids are skipped)
    pub added: Vec<ClaimedVolunteer>,
    /// Roster after the write
    pub roster: Vec<ClaimedVolunteer>,
    /// Version-conflict retries it took to land the write
    pub retries: u32,
}
