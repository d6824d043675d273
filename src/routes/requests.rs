use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::db::models::{HelpRequest, ScheduleChangeRequest};
use crate::error::AppResult;
use crate::routes::auth::AuthSession;
use crate::services::requests::{ChangeRequestCreated, HelpRequestCreated, RequestService};
use crate::services::today;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/help", get(list_open_help).post(create_help_request))
        .route("/help/:id/pick-up", post(pick_up_help))
        .route("/help/:id/resolve", post(resolve_help))
        .route("/changes", get(list_pending_changes).post(submit_change_request))
}

#[derive(Debug, Default, Deserialize)]
pub struct HelpBody {
    pub floor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FloorQuery {
    pub floor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveBody {
    #[serde(default)]
    pub escalated_to_rapid: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRequestBody {
    #[serde(default)]
    pub shifts_to_drop: Vec<String>,
    #[serde(default)]
    pub reason: String,
}

async fn create_help_request(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    body: Option<Json<HelpBody>>,
) -> AppResult<(StatusCode, Json<HelpRequestCreated>)> {
    let floor = body.and_then(|Json(b)| b.floor);
    let created = RequestService::create_help_request(&state, &session, floor).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_open_help(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Query(query): Query<FloorQuery>,
) -> AppResult<Json<Vec<HelpRequest>>> {
    session.require_lead()?;
    let floor = query.floor.as_deref().filter(|f| !f.trim().is_empty());
    Ok(Json(
        RequestService::list_open_help(&state, &session.event, floor).await?,
    ))
}

async fn pick_up_help(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> AppResult<Json<HelpRequest>> {
    Ok(Json(RequestService::pick_up_help(&state, &id, &session).await?))
}

async fn resolve_help(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
    body: Option<Json<ResolveBody>>,
) -> AppResult<Json<HelpRequest>> {
    let escalated = body.map(|Json(b)| b.escalated_to_rapid).unwrap_or(false);
    Ok(Json(
        RequestService::resolve_help(&state, &id, escalated, &session).await?,
    ))
}

async fn submit_change_request(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Json(body): Json<ChangeRequestBody>,
) -> AppResult<(StatusCode, Json<ChangeRequestCreated>)> {
    let created = RequestService::submit_change_request(
        &state,
        &session,
        body.shifts_to_drop,
        body.reason,
        today(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_pending_changes(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> AppResult<Json<Vec<ScheduleChangeRequest>>> {
    session.require_admin()?;
    Ok(Json(
        RequestService::list_pending_changes(&state, &session.event).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::CreateShift;
    use crate::db::ShiftRepository;
    use crate::services::session::{SessionRole, SessionService};
    use crate::services::shifts::ShiftService;
    use crate::test_support::{self, call};
    use serde_json::json;

    fn app(state: Arc<AppState>) -> Router {
        Router::new().nest("/api/requests", router()).with_state(state)
    }

    #[tokio::test]
    async fn help_flow_from_request_to_resolution() {
        let state = test_support::state().await;
        let volunteer = test_support::token(&state, "u-1", "RenderATL", SessionRole::Volunteer);
        let lead = test_support::token(&state, "lead", "RenderATL", SessionRole::TeamLead);

        let (status, created) = call(
            app(state.clone()),
            "POST",
            "/api/requests/help",
            Some(&volunteer),
            Some(json!({ "floor": "2" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created["message"]
            .as_str()
            .unwrap()
            .starts_with("A team lead has been notified. (Floor: 2)"));
        let id = created["request"]["id"].as_str().unwrap().to_string();

        let (status, _) = call(app(state.clone()), "GET", "/api/requests/help", Some(&volunteer), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, open) = call(app(state.clone()), "GET", "/api/requests/help?floor=2", Some(&lead), None).await;
        assert_eq!(open.as_array().unwrap().len(), 1);
        let (_, other_floor) = call(app(state.clone()), "GET", "/api/requests/help?floor=5", Some(&lead), None).await;
        assert_eq!(other_floor.as_array().unwrap().len(), 0);

        let (status, picked) = call(
            app(state.clone()),
            "POST",
            &format!("/api/requests/help/{id}/pick-up"),
            Some(&lead),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(picked["picked_up_by"], "lead");

        let (status, resolved) = call(
            app(state.clone()),
            "POST",
            &format!("/api/requests/help/{id}/resolve"),
            Some(&lead),
            Some(json!({ "escalated_to_rapid": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resolved["resolved"], true);
        assert_eq!(resolved["escalated_to_rapid"], true);

        let (_, open) = call(app(state), "GET", "/api/requests/help", Some(&lead), None).await;
        assert_eq!(open.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn help_without_floor_goes_to_main_floor() {
        let state = test_support::state().await;
        let volunteer = test_support::token(&state, "u-1", "RenderATL", SessionRole::Volunteer);

        let (status, created) = call(app(state), "POST", "/api/requests/help", Some(&volunteer), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["request"]["floor"], "Main Floor");
        assert!(created["message"]
            .as_str()
            .unwrap()
            .starts_with("A team lead has been notified.\n"));
    }

    #[tokio::test]
    async fn change_request_for_held_shift() {
        let state = test_support::state().await;
        test_support::seed_event_between(&state, "RenderATL", "2099-06-08", "2099-06-10", true).await;
        let shift = ShiftRepository::create(
            &state.db,
            CreateShift {
                event: "RenderATL".to_string(),
                date: "2099-06-08".to_string(),
                time_label: None,
                start_time: "9am".to_string(),
                end_time: "5pm".to_string(),
                floor: "1".to_string(),
                role: "Registration".to_string(),
                volunteers_needed: 3,
                overage_buffer: 0,
                team_leads_needed: 0,
                notes: String::new(),
            },
        )
        .await
        .unwrap();

        let volunteer = test_support::token(&state, "u-1", "RenderATL", SessionRole::Volunteer);
        let claims = SessionService::decode(&state.config.session, &volunteer).unwrap();
        ShiftService::claim(&state, &shift.id, &claims).await.unwrap();

        let (status, body) = call(
            app(state.clone()),
            "POST",
            "/api/requests/changes",
            Some(&volunteer),
            Some(json!({ "shifts_to_drop": ["someone-elses"], "reason": "sick" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["message"], "You can only drop shifts you are scheduled for.");

        let (status, body) = call(
            app(state.clone()),
            "POST",
            "/api/requests/changes",
            Some(&volunteer),
            Some(json!({ "shifts_to_drop": [shift.id], "reason": "sick" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Request submitted successfully!");

        let (status, _) = call(
            app(state.clone()),
            "POST",
            "/api/requests/changes",
            Some(&volunteer),
            Some(json!({ "shifts_to_drop": [shift.id], "reason": "again" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let admin = test_support::token(&state, "admin", "RenderATL", SessionRole::Admin);
        let (status, pending) = call(app(state), "GET", "/api/requests/changes", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending.as_array().unwrap().len(), 1);
    }
}
