use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Volunteer {
    /// Stable identifier generated at sign-up and used everywhere else
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub event: String,
    pub agreed_to_privacy: bool,
    pub signed_up_at: NaiveDateTime,
}
