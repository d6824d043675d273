use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Event Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Event {
    /// Event name, also the document id (e.g. "RenderATL")
    pub name: String,
    /// First day of the event (YYYY-MM-DD)
    pub start_date: String,
    /// Last day of the event (YYYY-MM-DD)
    pub end_date: String,
    /// When true volunteers claim shifts themselves; when false the scheduler fills them.
    pub manual_scheduling: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertEvent {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    /// Left untouched on existing events when omitted; new events default to manual.
    pub manual_scheduling: Option<bool>,
}
