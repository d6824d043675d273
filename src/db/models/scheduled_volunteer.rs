use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ROLE_TEAM_LEAD: &str = "teamlead";

/// Floor-level staffing assignment (e.g. team leads per floor).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScheduledVolunteer {
    pub id: String,
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub event: String,
    /// Floor label such as "Floor 2"
    pub assignment: String,
    pub role: String,
}
