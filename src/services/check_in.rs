use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::models::{CheckIn, ScheduledVolunteer, TaskCheckIn, ROLE_TEAM_LEAD};
use crate::db::{CheckInRepository, ScheduledVolunteerRepository, ShiftRepository};
use crate::error::{AppError, AppResult};
use crate::i18n::t;
use crate::services::events::DATE_FORMAT;
use crate::services::session::{SessionClaims, SessionRole, SessionService};
use crate::services::volunteers::VolunteerService;
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct CheckInLookupRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub event: String,
}

/// Answer to "I already checked in". A missing check-in is a normal answer,
/// not an error.
#[derive(Debug, Clone, Serialize)]
pub struct CheckInLookup {
    pub checked_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<SessionRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FloorInfo {
    pub floor: Option<String>,
    pub team_leads: Vec<ScheduledVolunteer>,
}

/// Staffing assignment label for a floor: "2" becomes "Floor 2".
pub fn floor_assignment(floor: &str) -> String {
    let floor = floor.trim();
    if floor.starts_with("Floor") {
        floor.to_string()
    } else {
        format!("Floor {}", floor)
    }
}

pub struct CheckInService;

impl CheckInService {
    pub async fn record(
        state: &Arc<AppState>,
        session: &SessionClaims,
        today: NaiveDate,
    ) -> AppResult<CheckIn> {
        let volunteer = VolunteerService::get(state, session.uid()).await?;
        let check_in = CheckInRepository::record(
            &state.db,
            &volunteer.uid,
            &volunteer.first_name,
            &volunteer.last_name,
            &session.event,
            &today.format(DATE_FORMAT).to_string(),
        )
        .await?;
        tracing::info!("{} checked in for {}", volunteer.uid, session.event);
        Ok(check_in)
    }

    /// Recover a session for a volunteer who checked in today by name.
    pub async fn lookup(
        state: &Arc<AppState>,
        request: CheckInLookupRequest,
        today: NaiveDate,
    ) -> AppResult<CheckInLookup> {
        let first_name = request.first_name.trim();
        let last_name = request.last_name.trim();
        if first_name.is_empty() || last_name.is_empty() || request.event.trim().is_empty() {
            return Err(AppError::Validation(t("validation.missing_fields")));
        }

        let found = CheckInRepository::find_by_name_on(
            &state.db,
            request.event.trim(),
            first_name,
            last_name,
            &today.format(DATE_FORMAT).to_string(),
        )
        .await?;

        let check_in = match found {
            Some(c) => c,
            None => {
                tracing::debug!("No check-in today for {} {}", first_name, last_name);
                return Ok(CheckInLookup {
                    checked_in: false,
                    message: Some(t("checkin.not_found")),
                    uid: None,
                    role: None,
                    token: None,
                });
            }
        };

        let role = if ShiftRepository::is_team_lead(&state.db, &check_in.event, &check_in.uid).await? {
            SessionRole::TeamLead
        } else {
            SessionRole::Volunteer
        };
        let token = SessionService::issue(
            &state.config.session,
            &check_in.uid,
            &check_in.event,
            &check_in.first_name,
            &check_in.last_name,
            role,
        )?;

        Ok(CheckInLookup {
            checked_in: true,
            message: None,
            uid: Some(check_in.uid),
            role: Some(role),
            token: Some(token),
        })
    }

    pub async fn record_task(
        state: &Arc<AppState>,
        session: &SessionClaims,
        floor: &str,
        task: &str,
    ) -> AppResult<TaskCheckIn> {
        if floor.trim().is_empty() {
            return Err(AppError::Validation(t("validation.missing_fields")));
        }
        CheckInRepository::record_task(
            &state.db,
            session.uid(),
            &session.first_name,
            &session.event,
            floor.trim(),
            task.trim(),
        )
        .await
    }

    /// Where the volunteer works today and who leads that floor.
    ///
    /// The first of today's shifts holding the volunteer decides the floor;
    /// without one the latest task check-in does.
    pub async fn floor_for_today(
        state: &Arc<AppState>,
        event: &str,
        uid: &str,
        today: NaiveDate,
    ) -> AppResult<FloorInfo> {
        let date = today.format(DATE_FORMAT).to_string();
        let shifts = ShiftRepository::list_by_event_and_date(&state.db, event, &date).await?;

        let mut floor = shifts
            .into_iter()
            .find(|s| s.has_volunteer(uid) && !s.floor.trim().is_empty())
            .map(|s| s.floor);
        if floor.is_none() {
            floor = CheckInRepository::latest_task(&state.db, event, uid)
                .await?
                .map(|task| task.floor);
        }

        let team_leads = match &floor {
            Some(f) => {
                ScheduledVolunteerRepository::list_by_assignment(
                    &state.db,
                    event,
                    &floor_assignment(f),
                    ROLE_TEAM_LEAD,
                )
                .await?
            }
            None => Vec::new(),
        };

        Ok(FloorInfo { floor, team_leads })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::CreateShift;
    use crate::db::VolunteerRepository;
    use crate::services::events::parse_date;
    use crate::services::shifts::ShiftService;
    use crate::test_support;

    fn today() -> NaiveDate {
        parse_date("2025-06-08").unwrap()
    }

    fn lookup_request(first: &str, last: &str) -> CheckInLookupRequest {
        CheckInLookupRequest {
            first_name: first.to_string(),
            last_name: last.to_string(),
            event: "RenderATL".to_string(),
        }
    }

    #[test]
    fn floor_labels() {
        assert_eq!(floor_assignment("2"), "Floor 2");
        assert_eq!(floor_assignment("Floor 3"), "Floor 3");
    }

    #[tokio::test]
    async fn lookup_without_check_in_is_a_plain_negative() {
        let state = test_support::state().await;
        let result = CheckInService::lookup(&state, lookup_request("Ada", "Lovelace"), today())
            .await
            .unwrap();
        assert!(!result.checked_in);
        assert_eq!(result.message, Some(t("checkin.not_found")));
        assert!(result.token.is_none());
    }

    #[tokio::test]
    async fn lookup_restores_team_lead_role() {
        let state = test_support::state().await;
        test_support::seed_event(&state, "RenderATL", true).await;
        VolunteerRepository::create(&state.db, "u-1", "Ada", "Lovelace", "RenderATL")
            .await
            .unwrap();
        CheckInRepository::record(&state.db, "u-1", "Ada", "Lovelace", "RenderATL", "2025-06-08")
            .await
            .unwrap();

        let plain = CheckInService::lookup(&state, lookup_request("ada", "lovelace"), today())
            .await
            .unwrap();
        assert_eq!(plain.role, Some(SessionRole::Volunteer));

        let shift = ShiftRepository::create(
            &state.db,
            CreateShift {
                event: "RenderATL".to_string(),
                date: "2025-06-08".to_string(),
                time_label: None,
                start_time: "9am".to_string(),
                end_time: "5pm".to_string(),
                floor: "2".to_string(),
                role: "Stage".to_string(),
                volunteers_needed: 1,
                overage_buffer: 0,
                team_leads_needed: 1,
                notes: String::new(),
            },
        )
        .await
        .unwrap();
        ShiftRepository::set_team_lead(&state.db, &shift.id, "u-1").await.unwrap();

        let lead = CheckInService::lookup(&state, lookup_request("Ada", "Lovelace"), today())
            .await
            .unwrap();
        assert!(lead.checked_in);
        assert_eq!(lead.role, Some(SessionRole::TeamLead));
        let claims = SessionService::decode(&state.config.session, &lead.token.unwrap()).unwrap();
        assert_eq!(claims.sub, "u-1");
    }

    #[tokio::test]
    async fn floor_comes_from_shift_then_task_check_in() {
        let state = test_support::state().await;
        test_support::seed_event(&state, "RenderATL", true).await;
        let token = test_support::token(&state, "u-1", "RenderATL", SessionRole::Volunteer);
        let session = SessionService::decode(&state.config.session, &token).unwrap();

        ScheduledVolunteerRepository::create(&state.db, "u-lead", "Lee", "Tran", "RenderATL", "Floor 3", ROLE_TEAM_LEAD)
            .await
            .unwrap();

        let nothing = CheckInService::floor_for_today(&state, "RenderATL", "u-1", today()).await.unwrap();
        assert!(nothing.floor.is_none());

        CheckInService::record_task(&state, &session, "Floor 3", "Stage").await.unwrap();
        let from_task = CheckInService::floor_for_today(&state, "RenderATL", "u-1", today()).await.unwrap();
        assert_eq!(from_task.floor.as_deref(), Some("Floor 3"));
        assert_eq!(from_task.team_leads.len(), 1);

        let shift = ShiftService::create(
            &state,
            CreateShift {
                event: "RenderATL".to_string(),
                date: "2025-06-08".to_string(),
                time_label: None,
                start_time: "9am".to_string(),
                end_time: "5pm".to_string(),
                floor: "2".to_string(),
                role: "Registration".to_string(),
                volunteers_needed: 2,
                overage_buffer: 0,
                team_leads_needed: 0,
                notes: String::new(),
            },
        )
        .await
        .unwrap();
        ShiftService::claim(&state, &shift.id, &session).await.unwrap();

        let from_shift = CheckInService::floor_for_today(&state, "RenderATL", "u-1", today()).await.unwrap();
        assert_eq!(from_shift.floor.as_deref(), Some("2"));
        assert!(from_shift.team_leads.is_empty());
    }
}
