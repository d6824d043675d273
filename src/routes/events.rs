use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::catalog::EventProfile;
use crate::db::models::{Event, UpsertEvent};
use crate::error::AppResult;
use crate::routes::auth::AuthSession;
use crate::services::events::EventService;
use crate::services::session::{qr_secret, SessionService};
use crate::services::today;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_active))
        .route("/:name", get(get_event).put(upsert_event))
        .route("/:name/manual-scheduling", put(set_manual_scheduling))
        .route("/:name/profile", get(profile))
        .route("/:name/admin-code", get(admin_code))
}

#[derive(Debug, Deserialize)]
pub struct EventBody {
    pub start_date: String,
    pub end_date: String,
    pub manual_scheduling: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ManualSchedulingBody {
    pub manual_scheduling: bool,
}

async fn list_active(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Event>>> {
    Ok(Json(EventService::list_active(&state, today()).await?))
}

async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<Event>> {
    Ok(Json(EventService::get(&state, &name).await?))
}

async fn upsert_event(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(name): Path<String>,
    Json(body): Json<EventBody>,
) -> AppResult<Json<Event>> {
    session.require_admin()?;
    session.require_event(&name)?;

    let event = EventService::upsert(
        &state,
        UpsertEvent {
            name,
            start_date: body.start_date,
            end_date: body.end_date,
            manual_scheduling: body.manual_scheduling,
        },
    )
    .await?;
    Ok(Json(event))
}

async fn set_manual_scheduling(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(name): Path<String>,
    Json(body): Json<ManualSchedulingBody>,
) -> AppResult<Json<Event>> {
    session.require_admin()?;
    session.require_event(&name)?;
    Ok(Json(
        EventService::set_manual_scheduling(&state, &name, body.manual_scheduling).await?,
    ))
}

async fn profile(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Json<EventProfile> {
    Json(EventService::profile(&state, &name).clone())
}

#[derive(Debug, Serialize)]
pub struct AdminCode {
    pub event: String,
    /// Payload for the event's admin QR code
    pub code: String,
}

/// Lets a signed-in admin print the QR code for another admin of the event.
async fn admin_code(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(name): Path<String>,
) -> AppResult<Json<AdminCode>> {
    session.require_admin()?;
    session.require_event(&name)?;

    let event = EventService::get(&state, &name).await?;
    let code = SessionService::admin_code(qr_secret(&state.config)?, &event.name)?;
    tracing::info!("{} fetched the admin code for {}", session.uid(), event.name);

    Ok(Json(AdminCode {
        event: event.name,
        code,
    }))
}
