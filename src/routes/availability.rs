use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::models::Availability;
use crate::error::AppResult;
use crate::i18n::t;
use crate::routes::auth::AuthSession;
use crate::services::availability::AvailabilityService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(submit_availability))
        .route("/mine", get(my_availability))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityBody {
    /// Slot labels keyed by day (YYYY-MM-DD)
    #[serde(default)]
    pub days: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilitySubmitted {
    pub message: String,
    pub records: Vec<Availability>,
}

async fn submit_availability(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Json(body): Json<AvailabilityBody>,
) -> AppResult<Json<AvailabilitySubmitted>> {
    let records = AvailabilityService::submit(&state, &session, body.days).await?;
    Ok(Json(AvailabilitySubmitted {
        message: t("availability.submitted"),
        records,
    }))
}

async fn my_availability(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> AppResult<Json<Vec<Availability>>> {
    Ok(Json(AvailabilityService::list_mine(&state, &session).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::session::SessionRole;
    use crate::test_support::{self, call};
    use http::StatusCode;
    use serde_json::json;

    fn app(state: Arc<AppState>) -> Router {
        Router::new().nest("/api/availability", router()).with_state(state)
    }

    #[tokio::test]
    async fn submit_skips_empty_days_and_lists_mine() {
        let state = test_support::state().await;
        test_support::seed_event(&state, "RenderATL", false).await;
        let token = test_support::token(&state, "u-1", "RenderATL", SessionRole::Volunteer);

        let (status, body) = call(
            app(state.clone()),
            "POST",
            "/api/availability",
            Some(&token),
            Some(json!({
                "days": {
                    "2025-06-08": ["7am - 1pm", "1pm - 7pm"],
                    "2025-06-09": []
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Availability submitted.");
        assert_eq!(body["records"].as_array().unwrap().len(), 1);

        let (status, mine) = call(app(state), "GET", "/api/availability/mine", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine[0]["date"], "2025-06-08");
        assert_eq!(mine[0]["available_times"][1], "1pm - 7pm");
    }

    #[tokio::test]
    async fn nothing_selected_is_rejected() {
        let state = test_support::state().await;
        let token = test_support::token(&state, "u-1", "RenderATL", SessionRole::Volunteer);

        let (status, body) = call(
            app(state),
            "POST",
            "/api/availability",
            Some(&token),
            Some(json!({ "days": { "2025-06-08": [] } })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["message"], "Please select at least one time slot.");
    }

    #[tokio::test]
    async fn requires_a_session() {
        let state = test_support::state().await;
        let (status, _) = call(app(state), "GET", "/api/availability/mine", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
