use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::WaitlistEntry;
use crate::error::{AppError, AppResult};

pub struct WaitlistRepository;

impl WaitlistRepository {
    /// Adds the volunteer to a shift's waitlist. Returns `None` when they were
    /// already on it.
    pub async fn join(
        pool: &SqlitePool,
        shift_id: &str,
        event: &str,
        uid: &str,
        first_name: &str,
        last_name: &str,
    ) -> AppResult<Option<WaitlistEntry>> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, WaitlistEntry>(
            r#"
            INSERT INTO waitlist (id, shift_id, event, uid, first_name, last_name, joined_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(shift_id, uid) DO NOTHING
            RETURNING id, shift_id, event, uid, first_name, last_name, joined_at
            "#,
        )
        .bind(id)
        .bind(shift_id)
        .bind(event)
        .bind(uid)
        .bind(first_name)
        .bind(last_name)
        .bind(now)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_for_shift(pool: &SqlitePool, shift_id: &str) -> AppResult<Vec<WaitlistEntry>> {
        sqlx::query_as::<_, WaitlistEntry>(
            r#"
            SELECT id, shift_id, event, uid, first_name, last_name, joined_at
            FROM waitlist
            WHERE shift_id = ?
            ORDER BY joined_at ASC, rowid ASC
            "#,
        )
        .bind(shift_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_for_volunteer(
        pool: &SqlitePool,
        event: &str,
        uid: &str,
    ) -> AppResult<Vec<WaitlistEntry>> {
        sqlx::query_as::<_, WaitlistEntry>(
            r#"
            SELECT id, shift_id, event, uid, first_name, last_name, joined_at
            FROM waitlist
            WHERE event = ? AND uid = ?
            ORDER BY joined_at ASC
            "#,
        )
        .bind(event)
        .bind(uid)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }
}
