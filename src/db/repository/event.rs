use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::models::{Event, UpsertEvent};
use crate::error::{AppError, AppResult};

// ============================================================================
// Event Repository
// ============================================================================

pub struct EventRepository;

impl EventRepository {
    pub async fn find_by_name(pool: &SqlitePool, name: &str) -> AppResult<Option<Event>> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT name, start_date, end_date, manual_scheduling, created_at, updated_at
            FROM events
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list(pool: &SqlitePool) -> AppResult<Vec<Event>> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT name, start_date, end_date, manual_scheduling, created_at, updated_at
            FROM events
            ORDER BY start_date ASC, name ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Insert or update an event by name. `manual_scheduling` keeps its stored
    /// value when the input leaves it out.
    pub async fn upsert(pool: &SqlitePool, event: UpsertEvent) -> AppResult<Event> {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (name, start_date, end_date, manual_scheduling, created_at, updated_at)
            VALUES (?, ?, ?, COALESCE(?, 1), ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                manual_scheduling = COALESCE(?, events.manual_scheduling),
                updated_at = excluded.updated_at
            RETURNING name, start_date, end_date, manual_scheduling, created_at, updated_at
            "#,
        )
        .bind(&event.name)
        .bind(&event.start_date)
        .bind(&event.end_date)
        .bind(event.manual_scheduling)
        .bind(now)
        .bind(now)
        .bind(event.manual_scheduling)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn set_manual_scheduling(
        pool: &SqlitePool,
        name: &str,
        manual: bool,
    ) -> AppResult<Option<Event>> {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET manual_scheduling = ?, updated_at = ?
            WHERE name = ?
            RETURNING name, start_date, end_date, manual_scheduling, created_at, updated_at
            "#,
        )
        .bind(manual)
        .bind(now)
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }
}
