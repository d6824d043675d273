use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::AppResult;

pub const STATUS_PENDING: &str = "pending";

/// A volunteer's request to be taken off one or more shifts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleChangeRequest {
    pub id: String,
    pub uid: String,
    pub event: String,
    pub shifts_to_drop: Vec<String>,
    pub reason: String,
    pub status: String,
    pub created_at: NaiveDateTime,
}

impl ScheduleChangeRequest {
    pub fn from_row(r: &SqliteRow) -> AppResult<Self> {
        let shifts_to_drop: String = r.try_get("shifts_to_drop")?;
        Ok(ScheduleChangeRequest {
            id: r.try_get("id")?,
            uid: r.try_get("uid")?,
            event: r.try_get("event")?,
            shifts_to_drop: serde_json::from_str(&shifts_to_drop)?,
            reason: r.try_get("reason")?,
            status: r.try_get("status")?,
            created_at: r.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateScheduleChangeRequest {
    pub uid: String,
    pub event: String,
    pub shifts_to_drop: Vec<String>,
    pub reason: String,
}
