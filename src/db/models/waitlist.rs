use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Waitlist Models
// ============================================================================

/// A volunteer waiting for a spot on a full shift. Nothing promotes these
/// entries into the roster automatically.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: String,
    pub shift_id: String,
    pub event: String,
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub joined_at: NaiveDateTime,
}
