use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::models::Volunteer;
use crate::error::{AppError, AppResult};

pub struct VolunteerRepository;

impl VolunteerRepository {
    pub async fn create(
        pool: &SqlitePool,
        uid: &str,
        first_name: &str,
        last_name: &str,
        event: &str,
    ) -> AppResult<Volunteer> {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Volunteer>(
            r#"
            INSERT INTO volunteers (uid, first_name, last_name, event, agreed_to_privacy, signed_up_at)
            VALUES (?, ?, ?, ?, 1, ?)
            RETURNING uid, first_name, last_name, event, agreed_to_privacy, signed_up_at
            "#,
        )
        .bind(uid)
        .bind(first_name)
        .bind(last_name)
        .bind(event)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_uid(pool: &SqlitePool, uid: &str) -> AppResult<Option<Volunteer>> {
        sqlx::query_as::<_, Volunteer>(
            r#"
            SELECT uid, first_name, last_name, event, agreed_to_privacy, signed_up_at
            FROM volunteers
            WHERE uid = ?
            "#,
        )
        .bind(uid)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Case-insensitive match on both names within an event.
    pub async fn find_by_name(
        pool: &SqlitePool,
        event: &str,
        first_name: &str,
        last_name: &str,
    ) -> AppResult<Option<Volunteer>> {
        sqlx::query_as::<_, Volunteer>(
            r#"
            SELECT uid, first_name, last_name, event, agreed_to_privacy, signed_up_at
            FROM volunteers
            WHERE event = ?
              AND first_name = ? COLLATE NOCASE
              AND last_name = ? COLLATE NOCASE
            ORDER BY signed_up_at ASC
            LIMIT 1
            "#,
        )
        .bind(event)
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }
}
