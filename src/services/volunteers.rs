use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::db::models::Volunteer;
use crate::db::{EventRepository, VolunteerRepository};
use crate::error::{AppError, AppResult};
use crate::i18n::t;
use crate::services::session::{SessionRole, SessionService};
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub event: String,
    #[serde(default)]
    pub agreed_to_privacy: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpResponse {
    pub volunteer: Volunteer,
    pub token: String,
    /// Key the app keeps the uid under in its secure local storage
    pub storage_key: String,
}

/// New volunteer id: 16 random bytes laid out as a UUID v4.
pub fn generate_uid() -> String {
    uuid::Builder::from_random_bytes(rand::random()).into_uuid().to_string()
}

/// Local storage key for a volunteer's uid. Anything outside `[A-Za-z0-9._-]`
/// becomes `_`.
pub fn storage_key(first_name: &str, last_name: &str, event: &str) -> String {
    format!("uid_{} {}_{}", first_name, last_name, event)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub struct VolunteerService;

impl VolunteerService {
    pub async fn sign_up(state: &Arc<AppState>, request: SignUpRequest) -> AppResult<SignUpResponse> {
        let first_name = request.first_name.trim();
        let last_name = request.last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(AppError::Validation(t("validation.missing_name")));
        }
        if !request.agreed_to_privacy {
            return Err(AppError::Validation(t("validation.privacy_required")));
        }

        let event = EventRepository::find_by_name(&state.db, request.event.trim())
            .await?
            .ok_or_else(|| AppError::NotFound(t("not_found.event")))?;

        if VolunteerRepository::find_by_name(&state.db, &event.name, first_name, last_name)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(t("signup.already_registered")));
        }

        let uid = generate_uid();
        let volunteer =
            VolunteerRepository::create(&state.db, &uid, first_name, last_name, &event.name).await?;
        let token = SessionService::issue(
            &state.config.session,
            &volunteer.uid,
            &event.name,
            &volunteer.first_name,
            &volunteer.last_name,
            SessionRole::Volunteer,
        )?;

        tracing::info!("New volunteer {} signed up for {}", volunteer.uid, event.name);

        Ok(SignUpResponse {
            storage_key: storage_key(first_name, last_name, &event.name),
            volunteer,
            token,
        })
    }

    pub async fn get(state: &Arc<AppState>, uid: &str) -> AppResult<Volunteer> {
        VolunteerRepository::find_by_uid(&state.db, uid)
            .await?
            .ok_or_else(|| AppError::NotFound(t("not_found.volunteer")))
    }
}
