use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::catalog::EventProfile;
use crate::db::models::{Event, UpsertEvent};
use crate::db::EventRepository;
use crate::error::{AppError, AppResult};
use crate::i18n::t;
use crate::AppState;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Whether an event shows up in the event picker on `today`: from
/// `window_days` before it starts until its last day.
pub fn is_active(event: &Event, today: NaiveDate, window_days: i64) -> bool {
    match (parse_date(&event.start_date), parse_date(&event.end_date)) {
        (Some(start), Some(end)) => start - Duration::days(window_days) <= today && today <= end,
        _ => {
            tracing::debug!("Event {} has unparsable dates; hiding it", event.name);
            false
        }
    }
}

pub struct EventService;

impl EventService {
    pub async fn list_active(state: &Arc<AppState>, today: NaiveDate) -> AppResult<Vec<Event>> {
        let window = state.config.events.active_window_days;
        let events = EventRepository::list(&state.db).await?;
        Ok(events
            .into_iter()
            .filter(|e| is_active(e, today, window))
            .collect())
    }

    pub async fn get(state: &Arc<AppState>, name: &str) -> AppResult<Event> {
        EventRepository::find_by_name(&state.db, name)
            .await?
            .ok_or_else(|| AppError::NotFound(t("not_found.event")))
    }

    pub async fn upsert(state: &Arc<AppState>, input: UpsertEvent) -> AppResult<Event> {
        if input.name.trim().is_empty()
            || input.start_date.trim().is_empty()
            || input.end_date.trim().is_empty()
        {
            return Err(AppError::Validation(t("validation.missing_fields")));
        }

        let (start, end) = match (parse_date(&input.start_date), parse_date(&input.end_date)) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(AppError::Validation(
                    "Dates must use the YYYY-MM-DD format.".to_string(),
                ))
            }
        };
        if start > end {
            return Err(AppError::Validation(
                "The event cannot end before it starts.".to_string(),
            ));
        }

        let event = EventRepository::upsert(
            &state.db,
            UpsertEvent {
                name: input.name.trim().to_string(),
                start_date: start.format(DATE_FORMAT).to_string(),
                end_date: end.format(DATE_FORMAT).to_string(),
                manual_scheduling: input.manual_scheduling,
            },
        )
        .await?;

        tracing::info!(
            "Saved event {} ({} to {}, manual scheduling: {})",
            event.name,
            event.start_date,
            event.end_date,
            event.manual_scheduling
        );
        Ok(event)
    }

    pub async fn set_manual_scheduling(
        state: &Arc<AppState>,
        name: &str,
        manual: bool,
    ) -> AppResult<Event> {
        let event = EventRepository::set_manual_scheduling(&state.db, name, manual)
            .await?
            .ok_or_else(|| AppError::NotFound(t("not_found.event")))?;
        tracing::info!("Event {} manual scheduling set to {}", name, manual);
        Ok(event)
    }

    pub fn profile<'s>(state: &'s AppState, name: &str) -> &'s EventProfile {
        state.catalog.profile_for(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[tokio::test]
    async fn active_window_opens_before_start_and_closes_after_end() {
        let state = test_support::state().await;
        let event = test_support::seed_event(&state, "RenderATL", true).await;

        assert!(!is_active(&event, date("2025-04-23"), 45));
        assert!(is_active(&event, date("2025-04-24"), 45));
        assert!(is_active(&event, date("2025-06-10"), 45));
        assert!(!is_active(&event, date("2025-06-11"), 45));

        let listed = EventService::list_active(&state, date("2025-06-01")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(EventService::list_active(&state, date("2025-07-01")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_validates_dates() {
        let state = test_support::state().await;
        let bad = UpsertEvent {
            name: "ATW".to_string(),
            start_date: "2025-06-10".to_string(),
            end_date: "2025-06-08".to_string(),
            manual_scheduling: None,
        };
        assert!(matches!(EventService::upsert(&state, bad).await, Err(AppError::Validation(_))));

        let garbled = UpsertEvent {
            name: "ATW".to_string(),
            start_date: "June 8".to_string(),
            end_date: "2025-06-10".to_string(),
            manual_scheduling: None,
        };
        assert!(matches!(
            EventService::upsert(&state, garbled).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn toggle_unknown_event_is_not_found() {
        let state = test_support::state().await;
        let err = EventService::set_manual_scheduling(&state, "Nope", false).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn profile_comes_from_the_catalog() {
        let state = test_support::state().await;
        let profile = EventService::profile(&state, "govtechcon");
        assert_eq!(profile.name, "GovTechCon");
    }
}
