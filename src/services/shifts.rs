//! Shift administration and the volunteer claim / waitlist path.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::models::{
    ClaimedVolunteer, CreateShift, Event, Shift, WaitlistEntry, ROLE_TEAM_LEAD,
};
use crate::db::{
    AppendPolicy, ChangeRequestRepository, EventRepository, ScheduledVolunteerRepository,
    ShiftRepository, WaitlistRepository,
};
use crate::error::{AppError, AppResult};
use crate::i18n::{t, t_with};
use crate::services::check_in::floor_assignment;
use crate::services::events::{parse_date, DATE_FORMAT};
use crate::services::session::SessionClaims;
use crate::AppState;

/// One volunteer on one of today's shifts.
#[derive(Debug, Clone, Serialize)]
pub struct TodayEntry {
    pub shift_id: String,
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    pub start_time: String,
    pub end_time: String,
    pub floor: String,
    pub shift_role: String,
    pub is_team_lead: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolunteerShifts {
    pub event: String,
    pub manual_scheduling: bool,
    pub schedule_locked: bool,
    pub mine: Vec<Shift>,
    pub available: Vec<Shift>,
    /// Shift ids the volunteer is wait-listed on
    pub waitlisted: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimOutcome {
    pub claimed: bool,
    pub message: String,
    pub shift: Shift,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaitlistOutcome {
    pub joined: bool,
    pub message: String,
    pub entry: Option<WaitlistEntry>,
}

pub struct ShiftService;

impl ShiftService {
    pub async fn create(state: &Arc<AppState>, input: CreateShift) -> AppResult<Shift> {
        if input.event.trim().is_empty()
            || input.date.trim().is_empty()
            || input.start_time.trim().is_empty()
            || input.end_time.trim().is_empty()
            || input.role.trim().is_empty()
        {
            return Err(AppError::Validation(t("validation.missing_fields")));
        }
        let date = parse_date(&input.date).ok_or_else(|| {
            AppError::Validation("Dates must use the YYYY-MM-DD format.".to_string())
        })?;
        if input.volunteers_needed < 0 || input.overage_buffer < 0 || input.team_leads_needed < 0 {
            return Err(AppError::Validation(
                "Headcounts cannot be negative.".to_string(),
            ));
        }

        EventRepository::find_by_name(&state.db, &input.event)
            .await?
            .ok_or_else(|| AppError::NotFound(t("not_found.event")))?;

        let shift = ShiftRepository::create(
            &state.db,
            CreateShift {
                date: date.format(DATE_FORMAT).to_string(),
                ..input
            },
        )
        .await?;

        tracing::info!(
            "Created shift {} for {} on {} ({}), {} needed + {} buffer",
            shift.id,
            shift.event,
            shift.date,
            shift.time_label,
            shift.volunteers_needed,
            shift.overage_buffer
        );
        Ok(shift)
    }

    pub async fn list_by_date(
        state: &Arc<AppState>,
        event: &str,
        date: &str,
    ) -> AppResult<Vec<Shift>> {
        ShiftRepository::list_by_event_and_date(&state.db, event, date).await
    }

    pub async fn get(state: &Arc<AppState>, shift_id: &str) -> AppResult<Shift> {
        ShiftRepository::find_by_id(&state.db, shift_id)
            .await?
            .ok_or_else(|| AppError::NotFound(t("not_found.shift")))
    }

    /// Make a rostered volunteer the shift's team lead.
    pub async fn assign_team_lead(
        state: &Arc<AppState>,
        shift_id: &str,
        uid: &str,
    ) -> AppResult<(Shift, String)> {
        let shift = Self::get(state, shift_id).await?;
        let member = shift
            .claimed_by
            .iter()
            .find(|v| v.uid == uid)
            .ok_or_else(|| AppError::Validation(t_with("validation.not_on_roster", &[("name", uid)])))?;
        let name = format!("{} {}", member.first_name, member.last_name);

        let updated = ShiftRepository::set_team_lead(&state.db, shift_id, uid).await?;
        tracing::info!("{} is now team lead of shift {}", uid, shift_id);

        // Floor staffing is what volunteers see as "your team lead".
        if !updated.floor.trim().is_empty() {
            let assignment = floor_assignment(&updated.floor);
            let leads = ScheduledVolunteerRepository::list_by_assignment(
                &state.db,
                &updated.event,
                &assignment,
                ROLE_TEAM_LEAD,
            )
            .await?;
            if !leads.iter().any(|l| l.uid == uid) {
                ScheduledVolunteerRepository::create(
                    &state.db,
                    uid,
                    &member.first_name,
                    &member.last_name,
                    &updated.event,
                    &assignment,
                    ROLE_TEAM_LEAD,
                )
                .await?;
            }
        }

        Ok((updated, t_with("team_lead.assigned", &[("name", name.as_str())])))
    }

    /// Everyone working today, shift by shift.
    pub async fn today_schedule(
        state: &Arc<AppState>,
        event: &str,
        today: NaiveDate,
    ) -> AppResult<Vec<TodayEntry>> {
        let date = today.format(DATE_FORMAT).to_string();
        let shifts = ShiftRepository::list_by_event_and_date(&state.db, event, &date).await?;

        Ok(shifts
            .iter()
            .flat_map(|shift| {
                shift.claimed_by.iter().map(move |v| TodayEntry {
                    shift_id: shift.id.clone(),
                    uid: v.uid.clone(),
                    first_name: v.first_name.clone(),
                    last_name: v.last_name.clone(),
                    start_time: shift.start_time.clone(),
                    end_time: shift.end_time.clone(),
                    floor: shift.floor.clone(),
                    shift_role: shift.role.clone(),
                    is_team_lead: shift.team_lead_uid.as_deref() == Some(v.uid.as_str()),
                })
            })
            .collect())
    }

    /// A schedule is locked once a change request is pending or the event is
    /// less than `schedule_lock_days` away.
    pub async fn is_schedule_locked(
        state: &Arc<AppState>,
        event: &Event,
        uid: &str,
        today: NaiveDate,
    ) -> AppResult<bool> {
        if ChangeRequestRepository::has_pending(&state.db, &event.name, uid).await? {
            return Ok(true);
        }

        Ok(match parse_date(&event.start_date) {
            Some(start) => (start - today).num_days() < state.config.events.schedule_lock_days,
            None => false,
        })
    }

    /// Upcoming shifts split into the volunteer's own and the ones still open.
    pub async fn volunteer_view(
        state: &Arc<AppState>,
        event_name: &str,
        uid: &str,
        today: NaiveDate,
    ) -> AppResult<VolunteerShifts> {
        let event = EventRepository::find_by_name(&state.db, event_name)
            .await?
            .ok_or_else(|| AppError::NotFound(t("not_found.event")))?;
        let from = today.format(DATE_FORMAT).to_string();
        let shifts = ShiftRepository::list_upcoming(&state.db, &event.name, &from).await?;
        let waitlisted = WaitlistRepository::list_for_volunteer(&state.db, &event.name, uid)
            .await?
            .into_iter()
            .map(|w| w.shift_id)
            .collect();
        let schedule_locked = Self::is_schedule_locked(state, &event, uid, today).await?;

        let (mine, rest): (Vec<Shift>, Vec<Shift>) =
            shifts.into_iter().partition(|s| s.has_volunteer(uid));
        let available = rest.into_iter().filter(|s| !s.is_full()).collect();

        Ok(VolunteerShifts {
            event: event.name,
            manual_scheduling: event.manual_scheduling,
            schedule_locked,
            mine,
            available,
            waitlisted,
        })
    }

    /// Put the session's volunteer on a shift.
    ///
    /// Only events in manual scheduling mode accept claims. The capacity check
    /// happens inside the guarded append, so two volunteers racing for the last
    /// spot cannot both get it.
    pub async fn claim(
        state: &Arc<AppState>,
        shift_id: &str,
        session: &SessionClaims,
    ) -> AppResult<ClaimOutcome> {
        let shift = Self::get(state, shift_id).await?;
        session.require_event(&shift.event)?;

        let event = EventRepository::find_by_name(&state.db, &shift.event)
            .await?
            .ok_or_else(|| AppError::NotFound(t("not_found.event")))?;
        if !event.manual_scheduling {
            return Err(AppError::Conflict(t("claim.auto_scheduled")));
        }

        if shift.has_volunteer(session.uid()) {
            return Ok(ClaimOutcome {
                claimed: false,
                message: t("claim.already_claimed"),
                shift,
            });
        }

        let me = ClaimedVolunteer::volunteer(session.uid(), &session.first_name, &session.last_name);
        let policy = AppendPolicy {
            max_retries: state.config.scheduler.max_write_retries,
            enforce_capacity: true,
        };
        let appended = ShiftRepository::guarded_append(&state.db, &shift.id, &[me], policy).await?;

        let claimed = !appended.added.is_empty();
        if claimed {
            tracing::info!("{} claimed shift {}", session.uid(), shift.id);
        }
        let message = if claimed {
            t("claim.success")
        } else {
            t("claim.already_claimed")
        };

        Ok(ClaimOutcome {
            claimed,
            message,
            shift: Shift {
                claimed_by: appended.roster,
                ..shift
            },
        })
    }

    pub async fn join_waitlist(
        state: &Arc<AppState>,
        shift_id: &str,
        session: &SessionClaims,
    ) -> AppResult<WaitlistOutcome> {
        let shift = Self::get(state, shift_id).await?;
        session.require_event(&shift.event)?;

        if shift.has_volunteer(session.uid()) {
            return Ok(WaitlistOutcome {
                joined: false,
                message: t("claim.already_claimed"),
                entry: None,
            });
        }
        if !shift.is_full() {
            return Err(AppError::Conflict(t("waitlist.shift_open")));
        }

        let entry = WaitlistRepository::join(
            &state.db,
            &shift.id,
            &shift.event,
            session.uid(),
            &session.first_name,
            &session.last_name,
        )
        .await?;

        let joined = entry.is_some();
        let message = if joined {
            tracing::info!("{} joined the waitlist of shift {}", session.uid(), shift.id);
            t("waitlist.joined")
        } else {
            t("waitlist.already_joined")
        };

        Ok(WaitlistOutcome {
            joined,
            message,
            entry,
        })
    }
}
