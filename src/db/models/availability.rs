use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::AppResult;

// ============================================================================
// Availability Models
// ============================================================================

/// A volunteer's open slots for one day of an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub id: String,
    pub event: String,
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub date: String,
    /// Slot labels, compared verbatim with shift `time_label`s
    pub available_times: Vec<String>,
    /// Shifts the volunteer already held when this record was submitted
    pub shifts_count: i64,
    pub submitted_at: NaiveDateTime,
}

impl Availability {
    pub fn from_row(r: &SqliteRow) -> AppResult<Self> {
        let available_times: String = r.try_get("available_times")?;
        Ok(Availability {
            id: r.try_get("id")?,
            event: r.try_get("event")?,
            uid: r.try_get("uid")?,
            first_name: r.try_get("first_name")?,
            last_name: r.try_get("last_name")?,
            date: r.try_get("date")?,
            available_times: serde_json::from_str(&available_times)?,
            shifts_count: r.try_get("shifts_count")?,
            submitted_at: r.try_get("submitted_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UpsertAvailability {
    pub event: String,
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub date: String,
    pub available_times: Vec<String>,
    pub shifts_count: i64,
}
