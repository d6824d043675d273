use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::models::{CheckIn, TaskCheckIn, Volunteer};
use crate::error::AppResult;
use crate::i18n::t;
use crate::routes::auth::AuthSession;
use crate::services::check_in::{CheckInService, FloorInfo};
use crate::services::today;
use crate::services::volunteers::VolunteerService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/floor", get(my_floor))
        .route("/check-in", post(check_in))
        .route("/task-check-in", post(task_check_in))
}

#[derive(Debug, Serialize)]
pub struct CheckInRecorded {
    pub message: String,
    pub check_in: CheckIn,
}

#[derive(Debug, Deserialize)]
pub struct TaskCheckInBody {
    #[serde(default)]
    pub floor: String,
    #[serde(default)]
    pub task: String,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> AppResult<Json<Volunteer>> {
    Ok(Json(VolunteerService::get(&state, session.uid()).await?))
}

async fn my_floor(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> AppResult<Json<FloorInfo>> {
    let info = CheckInService::floor_for_today(&state, &session.event, session.uid(), today()).await?;
    Ok(Json(info))
}

async fn check_in(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> AppResult<Json<CheckInRecorded>> {
    let check_in = CheckInService::record(&state, &session, today()).await?;
    Ok(Json(CheckInRecorded {
        message: t("checkin.recorded"),
        check_in,
    }))
}

async fn task_check_in(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Json(body): Json<TaskCheckInBody>,
) -> AppResult<(StatusCode, Json<TaskCheckIn>)> {
    let record = CheckInService::record_task(&state, &session, &body.floor, &body.task).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::VolunteerRepository;
    use crate::services::session::SessionRole;
    use crate::test_support::{self, call};
    use serde_json::json;

    fn app(state: Arc<AppState>) -> Router {
        Router::new().nest("/api/volunteers", router()).with_state(state)
    }

    #[tokio::test]
    async fn me_returns_the_volunteer_record() {
        let state = test_support::state().await;
        VolunteerRepository::create(&state.db, "u-1", "Ada", "Lovelace", "RenderATL")
            .await
            .unwrap();
        let token = test_support::token(&state, "u-1", "RenderATL", SessionRole::Volunteer);

        let (status, body) = call(app(state.clone()), "GET", "/api/volunteers/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["first_name"], "Ada");

        let stranger = test_support::token(&state, "u-404", "RenderATL", SessionRole::Volunteer);
        let (status, _) = call(app(state), "GET", "/api/volunteers/me", Some(&stranger), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn check_in_is_recorded() {
        let state = test_support::state().await;
        VolunteerRepository::create(&state.db, "u-1", "Ada", "Lovelace", "RenderATL")
            .await
            .unwrap();
        let token = test_support::token(&state, "u-1", "RenderATL", SessionRole::Volunteer);

        let (status, body) = call(app(state), "POST", "/api/volunteers/check-in", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "You're checked in.");
        assert_eq!(body["check_in"]["uid"], "u-1");
    }

    #[tokio::test]
    async fn task_check_in_sets_the_floor() {
        let state = test_support::state().await;
        let token = test_support::token(&state, "u-1", "RenderATL", SessionRole::Volunteer);

        let (status, _) = call(
            app(state.clone()),
            "POST",
            "/api/volunteers/task-check-in",
            Some(&token),
            Some(json!({ "floor": "", "task": "Badges" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = call(
            app(state.clone()),
            "POST",
            "/api/volunteers/task-check-in",
            Some(&token),
            Some(json!({ "floor": "3", "task": "Badges" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["task"], "Badges");

        let (status, floor) = call(app(state), "GET", "/api/volunteers/me/floor", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(floor["floor"], "3");
        assert_eq!(floor["team_leads"].as_array().unwrap().len(), 0);
    }
}
