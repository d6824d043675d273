use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::models::{CreateShift, Shift, WaitlistEntry};
use crate::db::WaitlistRepository;
use crate::error::AppResult;
use crate::i18n::t;
use crate::routes::auth::AuthSession;
use crate::services::shifts::{
    ClaimOutcome, ShiftService, TodayEntry, VolunteerShifts, WaitlistOutcome,
};
use crate::services::today;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_by_date).post(create_shift))
        .route("/mine", get(my_shifts))
        .route("/today", get(today_schedule))
        .route("/:id", get(get_shift))
        .route("/:id/claim", post(claim_shift))
        .route("/:id/waitlist", get(list_waitlist).post(join_waitlist))
        .route("/:id/team-lead", put(assign_team_lead))
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct TeamLeadBody {
    pub uid: String,
}

#[derive(Debug, Serialize)]
pub struct ShiftWithMessage {
    pub shift: Shift,
    pub message: String,
}

async fn create_shift(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Json(input): Json<CreateShift>,
) -> AppResult<(StatusCode, Json<ShiftWithMessage>)> {
    session.require_admin()?;
    session.require_event(&input.event)?;

    let shift = ShiftService::create(&state, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ShiftWithMessage {
            shift,
            message: t("shift.created"),
        }),
    ))
}

async fn list_by_date(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Query(query): Query<DateQuery>,
) -> AppResult<Json<Vec<Shift>>> {
    session.require_admin()?;
    Ok(Json(
        ShiftService::list_by_date(&state, &session.event, &query.date).await?,
    ))
}

async fn my_shifts(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> AppResult<Json<VolunteerShifts>> {
    let view = ShiftService::volunteer_view(&state, &session.event, session.uid(), today()).await?;
    Ok(Json(view))
}

async fn today_schedule(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
) -> AppResult<Json<Vec<TodayEntry>>> {
    session.require_lead()?;
    Ok(Json(
        ShiftService::today_schedule(&state, &session.event, today()).await?,
    ))
}

async fn get_shift(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> AppResult<Json<Shift>> {
    let shift = ShiftService::get(&state, &id).await?;
    session.require_event(&shift.event)?;
    Ok(Json(shift))
}

async fn claim_shift(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> AppResult<Json<ClaimOutcome>> {
    Ok(Json(ShiftService::claim(&state, &id, &session).await?))
}

async fn join_waitlist(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> AppResult<Json<WaitlistOutcome>> {
    Ok(Json(ShiftService::join_waitlist(&state, &id, &session).await?))
}

async fn list_waitlist(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<WaitlistEntry>>> {
    session.require_admin()?;
    let shift = ShiftService::get(&state, &id).await?;
    session.require_event(&shift.event)?;
    Ok(Json(WaitlistRepository::list_for_shift(&state.db, &shift.id).await?))
}

async fn assign_team_lead(
    State(state): State<Arc<AppState>>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
    Json(body): Json<TeamLeadBody>,
) -> AppResult<Json<ShiftWithMessage>> {
    session.require_admin()?;
    let (shift, message) = ShiftService::assign_team_lead(&state, &id, &body.uid).await?;
    Ok(Json(ShiftWithMessage { shift, message }))
}
