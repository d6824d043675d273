use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::ScheduledVolunteer;
use crate::error::{AppError, AppResult};

pub struct ScheduledVolunteerRepository;

impl ScheduledVolunteerRepository {
    pub async fn create(
        pool: &SqlitePool,
        uid: &str,
        first_name: &str,
        last_name: &str,
        event: &str,
        assignment: &str,
        role: &str,
    ) -> AppResult<ScheduledVolunteer> {
        let id = Uuid::new_v4().to_string();

        sqlx::query_as::<_, ScheduledVolunteer>(
            r#"
            INSERT INTO scheduled_volunteers (id, uid, first_name, last_name, event, assignment, role)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, uid, first_name, last_name, event, assignment, role
            "#,
        )
        .bind(id)
        .bind(uid)
        .bind(first_name)
        .bind(last_name)
        .bind(event)
        .bind(assignment)
        .bind(role)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_by_assignment(
        pool: &SqlitePool,
        event: &str,
        assignment: &str,
        role: &str,
    ) -> AppResult<Vec<ScheduledVolunteer>> {
        sqlx::query_as::<_, ScheduledVolunteer>(
            r#"
            SELECT id, uid, first_name, last_name, event, assignment, role
            FROM scheduled_volunteers
            WHERE event = ? AND assignment = ? AND role = ?
            ORDER BY last_name ASC, first_name ASC
            "#,
        )
        .bind(event)
        .bind(assignment)
        .bind(role)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }
}
