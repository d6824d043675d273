use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Check-in Models
// ============================================================================

/// Arrival at the event on a given day.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: String,
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub event: String,
    /// Local day of the check-in (YYYY-MM-DD)
    pub check_in_date: String,
    pub checked_in_at: NaiveDateTime,
}

/// Check-in at a task station; the last one tells us where a volunteer is working.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskCheckIn {
    pub id: String,
    pub uid: String,
    pub name: String,
    pub event: String,
    pub floor: String,
    pub task: String,
    pub checked_in_at: NaiveDateTime,
}
