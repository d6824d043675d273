use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{CheckIn, TaskCheckIn};
use crate::error::{AppError, AppResult};

// ============================================================================
// Check-in Repository (arrival check-ins and task-station check-ins)
// ============================================================================

pub struct CheckInRepository;

impl CheckInRepository {
    pub async fn record(
        pool: &SqlitePool,
        uid: &str,
        first_name: &str,
        last_name: &str,
        event: &str,
        check_in_date: &str,
    ) -> AppResult<CheckIn> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, CheckIn>(
            r#"
            INSERT INTO check_ins (id, uid, first_name, last_name, event, check_in_date, checked_in_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, uid, first_name, last_name, event, check_in_date, checked_in_at
            "#,
        )
        .bind(id)
        .bind(uid)
        .bind(first_name)
        .bind(last_name)
        .bind(event)
        .bind(check_in_date)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Today's check-in for a name, case-insensitive.
    pub async fn find_by_name_on(
        pool: &SqlitePool,
        event: &str,
        first_name: &str,
        last_name: &str,
        check_in_date: &str,
    ) -> AppResult<Option<CheckIn>> {
        sqlx::query_as::<_, CheckIn>(
            r#"
            SELECT id, uid, first_name, last_name, event, check_in_date, checked_in_at
            FROM check_ins
            WHERE event = ?
              AND first_name = ? COLLATE NOCASE
              AND last_name = ? COLLATE NOCASE
              AND check_in_date = ?
            ORDER BY checked_in_at DESC
            LIMIT 1
            "#,
        )
        .bind(event)
        .bind(first_name)
        .bind(last_name)
        .bind(check_in_date)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn record_task(
        pool: &SqlitePool,
        uid: &str,
        name: &str,
        event: &str,
        floor: &str,
        task: &str,
    ) -> AppResult<TaskCheckIn> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, TaskCheckIn>(
            r#"
            INSERT INTO task_checkins (id, uid, name, event, floor, task, checked_in_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, uid, name, event, floor, task, checked_in_at
            "#,
        )
        .bind(id)
        .bind(uid)
        .bind(name)
        .bind(event)
        .bind(floor)
        .bind(task)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn latest_task(pool: &SqlitePool, event: &str, uid: &str) -> AppResult<Option<TaskCheckIn>> {
        sqlx::query_as::<_, TaskCheckIn>(
            r#"
            SELECT id, uid, name, event, floor, task, checked_in_at
            FROM task_checkins
            WHERE event = ? AND uid = ?
            ORDER BY checked_in_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(event)
        .bind(uid)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }
}
