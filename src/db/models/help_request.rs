use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_HELP_FLOOR: &str = "Main Floor";
pub const NOTIFY_TEAM_LEAD: &str = "team_lead";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HelpRequest {
    pub id: String,
    /// Requester's first name (shown to the team lead)
    pub name: String,
    pub event: String,
    pub floor: String,
    pub role_to_notify: String,
    pub resolved: bool,
    pub escalated_to_rapid: bool,
    pub picked_up_by: Option<String>,
    pub picked_up_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct CreateHelpRequest {
    pub name: String,
    pub event: String,
    pub floor: String,
}
