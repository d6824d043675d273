//! Help requests raised from the floor and schedule change requests.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::models::{
    CreateHelpRequest, CreateScheduleChangeRequest, HelpRequest, ScheduleChangeRequest,
    DEFAULT_HELP_FLOOR,
};
use crate::db::{ChangeRequestRepository, EventRepository, HelpRequestRepository, ShiftRepository};
use crate::error::{AppError, AppResult};
use crate::i18n::{t, t_with};
use crate::services::session::SessionClaims;
use crate::services::shifts::ShiftService;
use crate::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HelpRequestCreated {
    pub request: HelpRequest,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeRequestCreated {
    pub request: ScheduleChangeRequest,
    pub message: String,
}

pub struct RequestService;

impl RequestService {
    pub async fn create_help_request(
        state: &Arc<AppState>,
        session: &SessionClaims,
        floor: Option<String>,
    ) -> AppResult<HelpRequestCreated> {
        let floor = floor
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        let request = HelpRequestRepository::create(
            &state.db,
            CreateHelpRequest {
                name: session.first_name.clone(),
                event: session.event.clone(),
                floor: floor.clone().unwrap_or_else(|| DEFAULT_HELP_FLOOR.to_string()),
            },
        )
        .await?;
        tracing::info!(
            "Help requested by {} on {} ({})",
            session.uid(),
            request.floor,
            request.event
        );

        let floor_note = floor
            .map(|f| format!(" (Floor: {})", f))
            .unwrap_or_default();
        Ok(HelpRequestCreated {
            request,
            message: t_with("help.sent", &[("floor", floor_note.as_str())]),
        })
    }

    pub async fn list_open_help(
        state: &Arc<AppState>,
        event: &str,
        floor: Option<&str>,
    ) -> AppResult<Vec<HelpRequest>> {
        let open = HelpRequestRepository::list_open(&state.db, event).await?;
        Ok(match floor {
            Some(f) => open.into_iter().filter(|r| r.floor == f).collect(),
            None => open,
        })
    }

    pub async fn pick_up_help(
        state: &Arc<AppState>,
        id: &str,
        session: &SessionClaims,
    ) -> AppResult<HelpRequest> {
        session.require_lead()?;
        let request = HelpRequestRepository::pick_up(&state.db, id, session.uid())
            .await?
            .ok_or_else(|| AppError::NotFound(t("not_found.help_request")))?;
        session.require_event(&request.event)?;
        Ok(request)
    }

    pub async fn resolve_help(
        state: &Arc<AppState>,
        id: &str,
        escalated_to_rapid: bool,
        session: &SessionClaims,
    ) -> AppResult<HelpRequest> {
        session.require_lead()?;
        let request = HelpRequestRepository::resolve(&state.db, id, escalated_to_rapid)
            .await?
            .ok_or_else(|| AppError::NotFound(t("not_found.help_request")))?;
        tracing::info!("Help request {} resolved by {}", id, session.uid());
        Ok(request)
    }

    /// Ask to be taken off shifts the volunteer currently holds.
    pub async fn submit_change_request(
        state: &Arc<AppState>,
        session: &SessionClaims,
        shifts_to_drop: Vec<String>,
        reason: String,
        today: NaiveDate,
    ) -> AppResult<ChangeRequestCreated> {
        let mut shifts_to_drop: Vec<String> = shifts_to_drop
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        shifts_to_drop.dedup();
        if shifts_to_drop.is_empty() {
            return Err(AppError::Validation(t("validation.no_shifts_selected")));
        }

        let event = EventRepository::find_by_name(&state.db, &session.event)
            .await?
            .ok_or_else(|| AppError::NotFound(t("not_found.event")))?;

        let held = ShiftRepository::list_by_event(&state.db, &event.name).await?;
        let holds_all = shifts_to_drop.iter().all(|id| {
            held.iter()
                .any(|s| &s.id == id && s.has_volunteer(session.uid()))
        });
        if !holds_all {
            return Err(AppError::Validation(t("validation.shift_not_held")));
        }

        if ShiftService::is_schedule_locked(state, &event, session.uid(), today).await? {
            return Err(AppError::Conflict(t("change_request.locked")));
        }

        let request = ChangeRequestRepository::create(
            &state.db,
            CreateScheduleChangeRequest {
                uid: session.uid().to_string(),
                event: event.name.clone(),
                shifts_to_drop,
                reason: reason.trim().to_string(),
            },
        )
        .await?;
        tracing::info!(
            "{} asked to drop {} shift(s) of {}",
            session.uid(),
            request.shifts_to_drop.len(),
            event.name
        );

        Ok(ChangeRequestCreated {
            request,
            message: t("change_request.submitted"),
        })
    }

    pub async fn list_pending_changes(
        state: &Arc<AppState>,
        event: &str,
    ) -> AppResult<Vec<ScheduleChangeRequest>> {
        ChangeRequestRepository::list_pending(&state.db, event).await
    }
}
