//! Shift assignment engine.
//!
//! A run pairs volunteers who submitted availability with the shifts of one
//! event that share a time label, inside an inclusive date window. It is a
//! greedy pass: shifts are filled in fetch order, each one taking the
//! candidates with the fewest shifts already held. There is no backtracking
//! and no attempt at an optimal allocation.
//!
//! The run is split in two:
//! - `plan_assignments` is pure and decides who goes where.
//! - `apply_plan` writes the plan through a `RosterWriter`, one guarded
//!   roster append per shift. `BatchMode` decides whether a failure keeps the
//!   shifts written so far (`Sequential`) or rolls the whole run back (`Atomic`).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::models::{Availability, ClaimedVolunteer, RosterAppend, Shift};
use crate::db::{
    AppendPolicy, AvailabilityRepository, EventRepository, ShiftRepository, WriteTx,
};
use crate::error::{AppError, AppErrorWithDetails, AppResult};
use crate::i18n::{t, t_with};
use crate::AppState;

// ============================================================================
// Input
// ============================================================================

/// Headcount as typed into the admin form. Clients send either a JSON number
/// or the raw text field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Headcount {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchedulerInput {
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    /// Shift label to fill, matched verbatim against `Shift::time_label`
    #[serde(default)]
    pub time_range: String,
    #[serde(default)]
    pub volunteers_needed: Option<Headcount>,
    /// Overrides `SCHEDULER_ATOMIC_BATCHES` for this run
    #[serde(default)]
    pub atomic: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    pub start_date: String,
    pub end_date: String,
    pub time_label: String,
    pub volunteers_needed: usize,
}

impl SchedulerInput {
    /// Checks the four form fields. Runs before anything is read from the store.
    pub fn validate(&self) -> AppResult<RunParams> {
        let missing = || AppError::Validation(t("validation.missing_fields"));
        let invalid = || AppError::Validation(t("validation.volunteers_needed"));

        if self.start_date.trim().is_empty()
            || self.end_date.trim().is_empty()
            || self.time_range.trim().is_empty()
        {
            return Err(missing());
        }

        let needed = match &self.volunteers_needed {
            None => return Err(missing()),
            Some(Headcount::Text(raw)) if raw.trim().is_empty() => return Err(missing()),
            Some(Headcount::Text(raw)) => raw.trim().parse::<u32>().map_err(|_| invalid())?,
            Some(Headcount::Number(n)) => u32::try_from(*n).map_err(|_| invalid())?,
        };

        // Inverted windows are accepted and simply match nothing.
        Ok(RunParams {
            start_date: self.start_date.trim().to_string(),
            end_date: self.end_date.trim().to_string(),
            time_label: self.time_range.clone(),
            volunteers_needed: needed as usize,
        })
    }
}

// ============================================================================
// Planning
// ============================================================================

/// Volunteers chosen for one shift.
#[derive(Debug, Clone)]
pub struct ShiftPlan {
    pub shift_id: String,
    pub date: String,
    pub time_label: String,
    pub additions: Vec<ClaimedVolunteer>,
}

/// Decide which volunteers go on which shift.
///
/// Availability is indexed by uid in submission order. A later record for the
/// same uid replaces the earlier one but keeps its position. Anyone already on
/// one of `shifts`' rosters is excluded for the whole run, and so is every
/// volunteer this run places, so nobody lands on two shifts.
pub fn plan_assignments<'a>(
    shifts: &'a [Shift],
    availability: &'a [Availability],
    volunteers_needed: usize,
) -> Vec<ShiftPlan> {
    let mut order: Vec<&'a str> = Vec::new();
    let mut by_uid: HashMap<&'a str, &'a Availability> = HashMap::new();
    for record in availability {
        if by_uid.insert(record.uid.as_str(), record).is_none() {
            order.push(record.uid.as_str());
        }
    }

    let mut excluded: HashSet<&'a str> = shifts
        .iter()
        .flat_map(|s| s.claimed_by.iter().map(|v| v.uid.as_str()))
        .collect();

    let mut plans = Vec::with_capacity(shifts.len());
    for shift in shifts {
        let mut candidates: Vec<&'a Availability> = order
            .iter()
            .filter_map(|uid| by_uid.get(uid).copied())
            .filter(|r| !excluded.contains(r.uid.as_str()))
            .filter(|r| r.available_times.iter().any(|slot| *slot == shift.time_label))
            .collect();

        // stable: equal counts keep index order
        candidates.sort_by_key(|r| r.shifts_count);

        let additions: Vec<ClaimedVolunteer> = candidates
            .into_iter()
            .take(volunteers_needed)
            .map(|r| {
                excluded.insert(r.uid.as_str());
                ClaimedVolunteer::volunteer(&r.uid, &r.first_name, &r.last_name)
            })
            .collect();

        plans.push(ShiftPlan {
            shift_id: shift.id.clone(),
            date: shift.date.clone(),
            time_label: shift.time_label.clone(),
            additions,
        });
    }

    plans
}

/// A shift is under-filled when fewer than `floor(needed * ratio)` volunteers
/// were assigned to it.
pub fn is_under_filled(assigned: usize, needed: usize, ratio: f64) -> bool {
    (assigned as f64) < (needed as f64 * ratio).floor()
}

// ============================================================================
// Applying
// ============================================================================

/// Destination of roster appends.
#[async_trait]
pub trait RosterWriter: Send {
    async fn append(
        &mut self,
        shift_id: &str,
        additions: &[ClaimedVolunteer],
    ) -> AppResult<RosterAppend>;
}

enum WriteTarget<'c> {
    /// One `BEGIN IMMEDIATE` transaction per append
    Pool(&'c SqlitePool),
    /// A connection already holding the write lock
    Locked(&'c mut SqliteConnection),
}

/// Writes through the guarded roster append of `ShiftRepository`.
pub struct SqliteRosterWriter<'c> {
    target: WriteTarget<'c>,
    max_retries: u32,
}

impl<'c> SqliteRosterWriter<'c> {
    /// Every shift commits on its own.
    pub fn per_shift(pool: &'c SqlitePool, max_retries: u32) -> Self {
        SqliteRosterWriter {
            target: WriteTarget::Pool(pool),
            max_retries,
        }
    }

    /// Appends join the caller's write transaction.
    pub fn in_transaction(conn: &'c mut SqliteConnection, max_retries: u32) -> Self {
        SqliteRosterWriter {
            target: WriteTarget::Locked(conn),
            max_retries,
        }
    }
}

#[async_trait]
impl<'c> RosterWriter for SqliteRosterWriter<'c> {
    async fn append(
        &mut self,
        shift_id: &str,
        additions: &[ClaimedVolunteer],
    ) -> AppResult<RosterAppend> {
        let policy = AppendPolicy {
            max_retries: self.max_retries,
            enforce_capacity: false,
        };
        match &mut self.target {
            WriteTarget::Pool(pool) => {
                ShiftRepository::guarded_append(*pool, shift_id, additions, policy).await
            }
            WriteTarget::Locked(conn) => {
                ShiftRepository::append_to_roster(&mut **conn, shift_id, additions, policy).await
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// Each shift is committed on its own; a failure keeps earlier shifts.
    Sequential,
    /// The whole run is one transaction.
    Atomic,
}

impl BatchMode {
    pub fn resolve(requested: Option<bool>, atomic_by_default: bool) -> Self {
        if requested.unwrap_or(atomic_by_default) {
            BatchMode::Atomic
        } else {
            BatchMode::Sequential
        }
    }
}

#[derive(Debug)]
pub struct ApplyFailure {
    /// Shifts whose roster write landed before the failure
    pub committed: usize,
    pub error: AppError,
}

/// Write every plan in order, stopping at the first failure.
///
/// Returns, per plan, the volunteers that were actually added. That can be
/// fewer than planned when a concurrent writer put someone on the roster first.
pub async fn apply_plan<W: RosterWriter + ?Sized>(
    writer: &mut W,
    plans: &[ShiftPlan],
) -> Result<Vec<Vec<ClaimedVolunteer>>, ApplyFailure> {
    let mut added = Vec::with_capacity(plans.len());
    let mut committed = 0usize;

    for plan in plans {
        if plan.additions.is_empty() {
            added.push(Vec::new());
            continue;
        }

        match writer.append(&plan.shift_id, &plan.additions).await {
            Ok(result) => {
                if result.retries > 0 {
                    tracing::debug!(
                        "Shift {} roster landed after {} retries",
                        plan.shift_id,
                        result.retries
                    );
                }
                committed += 1;
                added.push(result.added);
            }
            Err(error) => return Err(ApplyFailure { committed, error }),
        }
    }

    Ok(added)
}

/// Apply a plan against the database with the given batch semantics.
///
/// On failure the error carries `committed_shifts` in its details: the number
/// of shifts left updated (always 0 for `Atomic`).
pub async fn commit_plan(
    pool: &SqlitePool,
    plans: &[ShiftPlan],
    mode: BatchMode,
    max_retries: u32,
) -> Result<Vec<Vec<ClaimedVolunteer>>, AppErrorWithDetails> {
    match mode {
        BatchMode::Sequential => {
            let mut writer = SqliteRosterWriter::per_shift(pool, max_retries);

            apply_plan(&mut writer, plans).await.map_err(|failure| {
                tracing::error!(
                    "Scheduler run aborted after {} committed shift(s): {}",
                    failure.committed,
                    failure.error
                );
                failure.error.with_details(serde_json::json!({
                    "committed_shifts": failure.committed,
                    "mode": BatchMode::Sequential,
                }))
            })
        }
        BatchMode::Atomic => {
            let mut tx = WriteTx::begin(pool).await?;
            let result = {
                let mut writer = SqliteRosterWriter::in_transaction(tx.conn()?, max_retries);
                apply_plan(&mut writer, plans).await
            };

            match result {
                Ok(added) => {
                    tx.commit().await?;
                    Ok(added)
                }
                Err(failure) => {
                    tx.rollback().await?;
                    tracing::error!(
                        "Scheduler run rolled back ({} shift(s) undone): {}",
                        failure.committed,
                        failure.error
                    );
                    Err(failure.error.with_details(serde_json::json!({
                        "committed_shifts": 0,
                        "mode": BatchMode::Atomic,
                    })))
                }
            }
        }
    }
}

// ============================================================================
// Service
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ShiftAssignment {
    pub shift_id: String,
    pub date: String,
    pub shift_time: String,
    pub assigned: Vec<ClaimedVolunteer>,
    pub assigned_count: usize,
    pub needed_count: usize,
    pub under_filled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerReport {
    pub event: String,
    pub mode: BatchMode,
    pub assignments: Vec<ShiftAssignment>,
    pub warnings: Vec<String>,
}

pub struct SchedulerService;

impl SchedulerService {
    /// Fill the event's open shifts for one label and date window.
    pub async fn run(
        state: &Arc<AppState>,
        event_name: &str,
        input: SchedulerInput,
    ) -> Result<SchedulerReport, AppErrorWithDetails> {
        let params = input.validate()?;
        let settings = &state.config.scheduler;

        let event = EventRepository::find_by_name(&state.db, event_name)
            .await?
            .ok_or_else(|| AppError::NotFound(t("not_found.event")))?;
        if event.manual_scheduling {
            return Err(AppError::Conflict(t("scheduler.manual_mode")).into());
        }

        let mode = BatchMode::resolve(input.atomic, settings.atomic_batches);

        let shifts = ShiftRepository::find_in_window(
            &state.db,
            &event.name,
            &params.start_date,
            &params.end_date,
            &params.time_label,
        )
        .await?;
        let availability = AvailabilityRepository::find_in_window(
            &state.db,
            &event.name,
            &params.start_date,
            &params.end_date,
        )
        .await?;

        tracing::info!(
            "Scheduling {} for {} ({} to {}, label {:?}): {} shift(s), {} availability record(s), mode {:?}",
            params.volunteers_needed,
            event.name,
            params.start_date,
            params.end_date,
            params.time_label,
            shifts.len(),
            availability.len(),
            mode
        );

        let plans = plan_assignments(&shifts, &availability, params.volunteers_needed);
        let added = commit_plan(&state.db, &plans, mode, settings.max_write_retries).await?;

        let mut assignments = Vec::with_capacity(plans.len());
        let mut warnings = Vec::new();
        for (plan, assigned) in plans.into_iter().zip(added) {
            let under_filled = is_under_filled(
                assigned.len(),
                params.volunteers_needed,
                settings.under_fill_ratio,
            );
            if under_filled {
                tracing::warn!(
                    "Shift {} on {} at {} under-filled: {}/{}",
                    plan.shift_id,
                    plan.date,
                    plan.time_label,
                    assigned.len(),
                    params.volunteers_needed
                );
                warnings.push(t_with(
                    "scheduler.under_filled",
                    &[("time", plan.time_label.as_str())],
                ));
            }

            assignments.push(ShiftAssignment {
                shift_id: plan.shift_id,
                date: plan.date,
                shift_time: plan.time_label,
                assigned_count: assigned.len(),
                assigned,
                needed_count: params.volunteers_needed,
                under_filled,
            });
        }

        Ok(SchedulerReport {
            event: event.name,
            mode,
            assignments,
            warnings,
        })
    }
}
