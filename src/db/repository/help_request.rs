use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{CreateHelpRequest, HelpRequest, NOTIFY_TEAM_LEAD};
use crate::error::{AppError, AppResult};

const HELP_COLUMNS: &str = r#"
    id, name, event, floor, role_to_notify, resolved, escalated_to_rapid,
    picked_up_by, picked_up_at, created_at
"#;

pub struct HelpRequestRepository;

impl HelpRequestRepository {
    pub async fn create(pool: &SqlitePool, input: CreateHelpRequest) -> AppResult<HelpRequest> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, HelpRequest>(&format!(
            r#"
            INSERT INTO help_requests (
                id, name, event, floor, role_to_notify, resolved, escalated_to_rapid, created_at
            ) VALUES (?, ?, ?, ?, ?, 0, 0, ?)
            RETURNING {HELP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.name)
        .bind(input.event)
        .bind(input.floor)
        .bind(NOTIFY_TEAM_LEAD)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Unresolved requests of an event, oldest first.
    pub async fn list_open(pool: &SqlitePool, event: &str) -> AppResult<Vec<HelpRequest>> {
        sqlx::query_as::<_, HelpRequest>(&format!(
            r#"
            SELECT {HELP_COLUMNS}
            FROM help_requests
            WHERE event = ? AND resolved = 0
            ORDER BY created_at ASC, rowid ASC
            "#
        ))
        .bind(event)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Marks the request as picked up by a team lead. A request already picked
    /// up keeps its first responder.
    pub async fn pick_up(pool: &SqlitePool, id: &str, picked_up_by: &str) -> AppResult<Option<HelpRequest>> {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, HelpRequest>(&format!(
            r#"
            UPDATE help_requests
            SET picked_up_by = COALESCE(picked_up_by, ?),
                picked_up_at = COALESCE(picked_up_at, ?)
            WHERE id = ?
            RETURNING {HELP_COLUMNS}
            "#
        ))
        .bind(picked_up_by)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn resolve(pool: &SqlitePool, id: &str, escalated_to_rapid: bool) -> AppResult<Option<HelpRequest>> {
        sqlx::query_as::<_, HelpRequest>(&format!(
            r#"
            UPDATE help_requests
            SET resolved = 1, escalated_to_rapid = ?
            WHERE id = ?
            RETURNING {HELP_COLUMNS}
            "#
        ))
        .bind(escalated_to_rapid)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;

    fn request(name: &str) -> CreateHelpRequest {
        CreateHelpRequest {
            name: name.to_string(),
            event: "RenderATL".to_string(),
            floor: "Floor 2".to_string(),
        }
    }

    #[tokio::test]
    async fn lifecycle_from_open_to_resolved() {
        let pool = testing::pool().await;
        let created = HelpRequestRepository::create(&pool, request("Ada")).await.unwrap();
        assert_eq!(created.role_to_notify, NOTIFY_TEAM_LEAD);
        assert!(!created.resolved);

        let picked = HelpRequestRepository::pick_up(&pool, &created.id, "u-lead")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(picked.picked_up_by.as_deref(), Some("u-lead"));

        let again = HelpRequestRepository::pick_up(&pool, &created.id, "u-other")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.picked_up_by.as_deref(), Some("u-lead"));

        HelpRequestRepository::resolve(&pool, &created.id, false).await.unwrap();
        assert!(HelpRequestRepository::list_open(&pool, "RenderATL").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_request_is_none() {
        let pool = testing::pool().await;
        assert!(HelpRequestRepository::resolve(&pool, "missing", true).await.unwrap().is_none());
    }
}
