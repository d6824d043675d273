use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::models::{Availability, UpsertAvailability};
use crate::db::{AvailabilityRepository, ShiftRepository};
use crate::error::{AppError, AppResult};
use crate::i18n::t;
use crate::services::events::{parse_date, DATE_FORMAT};
use crate::services::session::SessionClaims;
use crate::AppState;

pub struct AvailabilityService;

impl AvailabilityService {
    /// Store the volunteer's slots, one record per day.
    ///
    /// Days without a slot are skipped. `shifts_count` is how many of the
    /// event's shifts already list the volunteer, which is what the scheduler
    /// balances on.
    pub async fn submit(
        state: &Arc<AppState>,
        session: &SessionClaims,
        days: BTreeMap<String, Vec<String>>,
    ) -> AppResult<Vec<Availability>> {
        let mut selected: Vec<(String, Vec<String>)> = Vec::new();
        for (day, slots) in days {
            let slots: Vec<String> = slots
                .into_iter()
                .filter(|s| !s.trim().is_empty())
                .collect();
            if slots.is_empty() {
                continue;
            }
            let date = parse_date(&day).ok_or_else(|| {
                AppError::Validation("Dates must use the YYYY-MM-DD format.".to_string())
            })?;
            selected.push((date.format(DATE_FORMAT).to_string(), slots));
        }
        if selected.is_empty() {
            return Err(AppError::Validation(t("validation.no_availability")));
        }

        let shifts_count = ShiftRepository::list_by_event(&state.db, &session.event)
            .await?
            .iter()
            .filter(|s| s.has_volunteer(session.uid()))
            .count() as i64;

        let mut saved = Vec::with_capacity(selected.len());
        for (date, slots) in selected {
            let record = AvailabilityRepository::upsert(
                &state.db,
                UpsertAvailability {
                    event: session.event.clone(),
                    uid: session.uid().to_string(),
                    first_name: session.first_name.clone(),
                    last_name: session.last_name.clone(),
                    date,
                    available_times: slots,
                    shifts_count,
                },
            )
            .await?;
            saved.push(record);
        }

        tracing::info!(
            "{} submitted availability for {} day(s) of {}",
            session.uid(),
            saved.len(),
            session.event
        );
        Ok(saved)
    }

    pub async fn list_mine(state: &Arc<AppState>, session: &SessionClaims) -> AppResult<Vec<Availability>> {
        AvailabilityRepository::list_for_volunteer(&state.db, &session.event, session.uid()).await
    }
}
