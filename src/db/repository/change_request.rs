use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{CreateScheduleChangeRequest, ScheduleChangeRequest, STATUS_PENDING};
use crate::error::{AppError, AppResult};

pub struct ChangeRequestRepository;

impl ChangeRequestRepository {
    pub async fn create(
        pool: &SqlitePool,
        input: CreateScheduleChangeRequest,
    ) -> AppResult<ScheduleChangeRequest> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();
        let shifts = serde_json::to_string(&input.shifts_to_drop)?;

        let row = sqlx::query(
            r#"
            INSERT INTO schedule_change_requests (id, uid, event, shifts_to_drop, reason, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, uid, event, shifts_to_drop, reason, status, created_at
            "#,
        )
        .bind(id)
        .bind(input.uid)
        .bind(input.event)
        .bind(shifts)
        .bind(input.reason)
        .bind(STATUS_PENDING)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        ScheduleChangeRequest::from_row(&row)
    }

    pub async fn has_pending(pool: &SqlitePool, event: &str, uid: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM schedule_change_requests WHERE event = ? AND uid = ? AND status = ?",
        )
        .bind(event)
        .bind(uid)
        .bind(STATUS_PENDING)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(count > 0)
    }

    pub async fn list_pending(pool: &SqlitePool, event: &str) -> AppResult<Vec<ScheduleChangeRequest>> {
        let rows = sqlx::query(
            r#"
            SELECT id, uid, event, shifts_to_drop, reason, status, created_at
            FROM schedule_change_requests
            WHERE event = ? AND status = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(event)
        .bind(STATUS_PENDING)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        rows.iter().map(ScheduleChangeRequest::from_row).collect()
    }
}
