use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::EventRepository;
use crate::error::{AppError, AppResult};
use crate::i18n::t;
use crate::services::check_in::{CheckInLookup, CheckInLookupRequest, CheckInService};
use crate::services::session::{SessionClaims, SessionRole, SessionService, ADMIN_SUBJECT};
use crate::services::today;
use crate::services::volunteers::{SignUpRequest, SignUpResponse, VolunteerService};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(sign_up))
        .route("/check-in/lookup", post(lookup_check_in))
        .route("/admin", post(admin_login))
        .route("/me", get(me))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub event: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub token: String,
    pub event: String,
    pub role: SessionRole,
}

// ============================================================================
// Handlers
// ============================================================================

async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<SignUpResponse>)> {
    let response = VolunteerService::sign_up(&state, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn lookup_check_in(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckInLookupRequest>,
) -> AppResult<Json<CheckInLookup>> {
    let result = CheckInService::lookup(&state, request, today()).await?;
    Ok(Json(result))
}

/// Open an admin session by scanning the event's admin QR code.
async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdminLoginRequest>,
) -> AppResult<Json<AdminLoginResponse>> {
    if request.event.trim().is_empty() || request.code.trim().is_empty() {
        return Err(AppError::Validation(t("validation.missing_fields")));
    }

    let event = EventRepository::find_by_name(&state.db, request.event.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(t("not_found.event")))?;

    SessionService::verify_admin_code(&state.config, &event.name, &request.code).map_err(|e| {
        tracing::warn!("Rejected admin code for {}: {}", event.name, e);
        e
    })?;

    let token = SessionService::issue(
        &state.config.session,
        ADMIN_SUBJECT,
        &event.name,
        "Admin",
        "",
        SessionRole::Admin,
    )?;
    tracing::info!("Admin session opened for {}", event.name);

    Ok(Json(AdminLoginResponse {
        token,
        event: event.name,
        role: SessionRole::Admin,
    }))
}

async fn me(AuthSession(session): AuthSession) -> Json<SessionClaims> {
    Json(session)
}

// ============================================================================
// Session extractor
// ============================================================================

/// Claims of the bearer token on the request.
pub struct AuthSession(pub SessionClaims);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::debug!("Missing or invalid Authorization header");
                AppError::Unauthorized
            })?;

        if !auth_header.to_ascii_lowercase().starts_with("bearer ") {
            tracing::debug!("Authorization header doesn't start with 'Bearer '");
            return Err(AppError::Unauthorized);
        }

        let token = auth_header[7..].trim();
        if token.is_empty() {
            tracing::debug!("Empty bearer token in Authorization header");
            return Err(AppError::Unauthorized);
        }

        let claims = SessionService::decode(&state.config.session, token).map_err(|e| {
            tracing::debug!("Failed to decode session token: {:?}", e);
            e
        })?;

        tracing::debug!("Authenticated {} ({:?}) for {}", claims.sub, claims.role, claims.event);
        Ok(AuthSession(claims))
    }
}
