use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{Availability, UpsertAvailability};
use crate::error::{AppError, AppResult};

// ============================================================================
// Availability Repository
// ============================================================================

const AVAILABILITY_COLUMNS: &str = r#"
    id, event, uid, first_name, last_name, date, available_times, shifts_count, submitted_at
"#;

pub struct AvailabilityRepository;

impl AvailabilityRepository {
    /// One record per (event, uid, date); a resubmission replaces the slots.
    pub async fn upsert(pool: &SqlitePool, input: UpsertAvailability) -> AppResult<Availability> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();
        let times = serde_json::to_string(&input.available_times)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO availability (
                id, event, uid, first_name, last_name, date, available_times, shifts_count, submitted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(event, uid, date) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                available_times = excluded.available_times,
                shifts_count = excluded.shifts_count,
                submitted_at = excluded.submitted_at
            RETURNING {AVAILABILITY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.event)
        .bind(input.uid)
        .bind(input.first_name)
        .bind(input.last_name)
        .bind(input.date)
        .bind(times)
        .bind(input.shifts_count)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Availability::from_row(&row)
    }

    /// Records of an event inside an inclusive date window, oldest submission first.
    pub async fn find_in_window(
        pool: &SqlitePool,
        event: &str,
        start_date: &str,
        end_date: &str,
    ) -> AppResult<Vec<Availability>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {AVAILABILITY_COLUMNS}
            FROM availability
            WHERE event = ? AND date >= ? AND date <= ?
            ORDER BY submitted_at ASC, rowid ASC
            "#
        ))
        .bind(event)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        rows.iter().map(Availability::from_row).collect()
    }

    pub async fn list_for_volunteer(
        pool: &SqlitePool,
        event: &str,
        uid: &str,
    ) -> AppResult<Vec<Availability>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {AVAILABILITY_COLUMNS}
            FROM availability
            WHERE event = ? AND uid = ?
            ORDER BY date ASC
            "#
        ))
        .bind(event)
        .bind(uid)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        rows.iter().map(Availability::from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;

    fn input(uid: &str, date: &str, times: &[&str]) -> UpsertAvailability {
        UpsertAvailability {
            event: "RenderATL".to_string(),
            uid: uid.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            date: date.to_string(),
            available_times: times.iter().map(|t| t.to_string()).collect(),
            shifts_count: 0,
        }
    }

    #[tokio::test]
    async fn resubmission_replaces_slots() {
        let pool = testing::pool().await;
        AvailabilityRepository::upsert(&pool, input("u-1", "2025-06-08", &["7am - 1pm"]))
            .await
            .unwrap();
        let updated = AvailabilityRepository::upsert(&pool, input("u-1", "2025-06-08", &["1pm - 7pm"]))
            .await
            .unwrap();
        assert_eq!(updated.available_times, vec!["1pm - 7pm".to_string()]);

        let all = AvailabilityRepository::list_for_volunteer(&pool, "RenderATL", "u-1")
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn window_filters_by_event_and_dates() {
        let pool = testing::pool().await;
        AvailabilityRepository::upsert(&pool, input("u-1", "2025-06-08", &["a"])).await.unwrap();
        AvailabilityRepository::upsert(&pool, input("u-2", "2025-06-12", &["a"])).await.unwrap();
        let mut other = input("u-3", "2025-06-08", &["a"]);
        other.event = "ATW".to_string();
        AvailabilityRepository::upsert(&pool, other).await.unwrap();

        let found = AvailabilityRepository::find_in_window(&pool, "RenderATL", "2025-06-08", "2025-06-10")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uid, "u-1");
    }
}
