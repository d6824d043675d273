use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};

use crate::error::AppErrorWithDetails;
use crate::routes::auth::AuthSession;
use crate::services::scheduler::{SchedulerInput, SchedulerReport, SchedulerService};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/run", post(run_scheduler))
}

/// Run the scheduler for the admin's event. Partial-commit failures carry
/// `committed_shifts` in the error details.
async fn run_scheduler(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Json(input): Json<SchedulerInput>,
) -> Result<Json<SchedulerReport>, AppErrorWithDetails> {
    session.require_admin()?;

    let report = SchedulerService::run(&state, &session.event, input)
        .await
        .map_err(|e| {
            tracing::warn!("Scheduler run for {} failed: {}", session.event, e.error());
            e
        })?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CreateShift, UpsertAvailability};
    use crate::db::{AvailabilityRepository, ShiftRepository};
    use crate::services::session::SessionRole;
    use crate::test_support::{self, call};
    use http::StatusCode;
    use serde_json::json;

    fn app(state: Arc<AppState>) -> Router {
        Router::new().nest("/api/scheduler", router()).with_state(state)
    }

    fn run_body(needed: serde_json::Value) -> serde_json::Value {
        json!({
            "start_date": "2025-06-08",
            "end_date": "2025-06-08",
            "time_range": "7am - 1pm",
            "volunteers_needed": needed
        })
    }

    async fn seed_shift_and_availability(state: &Arc<AppState>) {
        ShiftRepository::create(
            &state.db,
            CreateShift {
                event: "RenderATL".to_string(),
                date: "2025-06-08".to_string(),
                time_label: None,
                start_time: "7am".to_string(),
                end_time: "1pm".to_string(),
                floor: "1".to_string(),
                role: "Registration".to_string(),
                volunteers_needed: 2,
                overage_buffer: 0,
                team_leads_needed: 0,
                notes: String::new(),
            },
        )
        .await
        .unwrap();

        for uid in ["u-1", "u-2", "u-3"] {
            AvailabilityRepository::upsert(
                &state.db,
                UpsertAvailability {
                    event: "RenderATL".to_string(),
                    uid: uid.to_string(),
                    first_name: uid.to_string(),
                    last_name: "Test".to_string(),
                    date: "2025-06-08".to_string(),
                    available_times: vec!["7am - 1pm".to_string()],
                    shifts_count: 0,
                },
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn admin_run_fills_matching_shift() {
        let state = test_support::state().await;
        test_support::seed_event(&state, "RenderATL", false).await;
        seed_shift_and_availability(&state).await;
        let admin = test_support::token(&state, "admin", "RenderATL", SessionRole::Admin);

        let (status, body) = call(
            app(state),
            "POST",
            "/api/scheduler/run",
            Some(&admin),
            Some(run_body(json!("2"))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "sequential");
        assert_eq!(body["assignments"][0]["assigned_count"], 2);
        assert_eq!(body["warnings"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn volunteers_cannot_run_scheduler() {
        let state = test_support::state().await;
        test_support::seed_event(&state, "RenderATL", false).await;
        let volunteer = test_support::token(&state, "u-1", "RenderATL", SessionRole::Volunteer);

        let (status, _) = call(
            app(state),
            "POST",
            "/api/scheduler/run",
            Some(&volunteer),
            Some(run_body(json!(2))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn manual_events_are_refused() {
        let state = test_support::state().await;
        test_support::seed_event(&state, "RenderATL", true).await;
        let admin = test_support::token(&state, "admin", "RenderATL", SessionRole::Admin);

        let (status, body) = call(
            app(state),
            "POST",
            "/api/scheduler/run",
            Some(&admin),
            Some(run_body(json!(2))),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn non_numeric_headcount_is_a_validation_error() {
        let state = test_support::state().await;
        test_support::seed_event(&state, "RenderATL", false).await;
        let admin = test_support::token(&state, "admin", "RenderATL", SessionRole::Admin);

        let (status, body) = call(
            app(state),
            "POST",
            "/api/scheduler/run",
            Some(&admin),
            Some(run_body(json!("two"))),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
