use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::db::models::{ClaimedVolunteer, CreateShift, RosterAppend, Shift};
use crate::db::WriteTx;
use crate::error::{AppError, AppResult};

const SHIFT_COLUMNS: &str = r#"
    id, event, date, time_label, start_time, end_time, floor, role,
    volunteers_needed, overage_buffer, max_signups, team_leads_needed, notes,
    claimed_by, team_lead_uid, version, created_at, updated_at
"#;

/// Knobs for a guarded roster append.
#[derive(Debug, Clone, Copy)]
pub struct AppendPolicy {
    /// Retries after losing the version race before giving up with `Conflict`.
    pub max_retries: u32,
    /// Refuse the append when it would push the roster past `Shift::claim_capacity`.
    pub enforce_capacity: bool,
}

/// Repository for the `shifts` collection.
///
/// Roster writes never overwrite blindly: `append_to_roster` re-reads the
/// roster together with its `version`, merges by uid and writes back with
/// `UPDATE ... WHERE version = ?`, retrying when another writer got there
/// first. Concurrent claims and scheduler runs therefore cannot lose each
/// other's appends or duplicate a volunteer.
///
/// Under WAL a read on a deferred transaction pins a snapshot that a later
/// write cannot upgrade from, so callers run the read-check-write under
/// `BEGIN IMMEDIATE` (`guarded_append`, or a `WriteTx` of their own).
pub struct ShiftRepository;

impl ShiftRepository {
    pub async fn create(pool: &SqlitePool, shift: CreateShift) -> AppResult<Shift> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();
        let time_label = shift
            .time_label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| format!("{} - {}", shift.start_time, shift.end_time));
        let max_signups = shift.volunteers_needed + shift.overage_buffer;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO shifts (
                id, event, date, time_label, start_time, end_time, floor, role,
                volunteers_needed, overage_buffer, max_signups, team_leads_needed, notes,
                claimed_by, team_lead_uid, version, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '[]', NULL, 0, ?, ?)
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(shift.event)
        .bind(shift.date)
        .bind(time_label)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.floor)
        .bind(shift.role)
        .bind(shift.volunteers_needed)
        .bind(shift.overage_buffer)
        .bind(max_signups)
        .bind(shift.team_leads_needed)
        .bind(shift.notes)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Shift::from_row(&row)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<Shift>> {
        let row = sqlx::query(&format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)?;

        row.as_ref().map(Shift::from_row).transpose()
    }

    /// Shifts of an event inside an inclusive date window with an exact label match.
    ///
    /// Dates compare as strings, so an inverted window simply matches nothing.
    /// Results come back in fetch order: by date, then creation order.
    pub async fn find_in_window(
        pool: &SqlitePool,
        event: &str,
        start_date: &str,
        end_date: &str,
        time_label: &str,
    ) -> AppResult<Vec<Shift>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SHIFT_COLUMNS}
            FROM shifts
            WHERE event = ? AND date >= ? AND date <= ? AND time_label = ?
            ORDER BY date ASC, created_at ASC, rowid ASC
            "#
        ))
        .bind(event)
        .bind(start_date)
        .bind(end_date)
        .bind(time_label)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        rows.iter().map(Shift::from_row).collect()
    }

    pub async fn list_by_event(pool: &SqlitePool, event: &str) -> AppResult<Vec<Shift>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SHIFT_COLUMNS}
            FROM shifts
            WHERE event = ?
            ORDER BY date ASC, start_time ASC, rowid ASC
            "#
        ))
        .bind(event)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        rows.iter().map(Shift::from_row).collect()
    }

    pub async fn list_by_event_and_date(
        pool: &SqlitePool,
        event: &str,
        date: &str,
    ) -> AppResult<Vec<Shift>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SHIFT_COLUMNS}
            FROM shifts
            WHERE event = ? AND date = ?
            ORDER BY start_time ASC, rowid ASC
            "#
        ))
        .bind(event)
        .bind(date)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        rows.iter().map(Shift::from_row).collect()
    }

    /// Shifts on or after `today` (YYYY-MM-DD).
    pub async fn list_upcoming(
        pool: &SqlitePool,
        event: &str,
        today: &str,
    ) -> AppResult<Vec<Shift>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SHIFT_COLUMNS}
            FROM shifts
            WHERE event = ? AND date >= ?
            ORDER BY date ASC, start_time ASC, rowid ASC
            "#
        ))
        .bind(event)
        .bind(today)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        rows.iter().map(Shift::from_row).collect()
    }

    pub async fn set_team_lead(pool: &SqlitePool, id: &str, uid: &str) -> AppResult<Shift> {
        let now = Utc::now().naive_utc();
        let row = sqlx::query(&format!(
            r#"
            UPDATE shifts
            SET team_lead_uid = ?, updated_at = ?
            WHERE id = ?
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(uid)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(crate::i18n::t("not_found.shift")))?;

        Shift::from_row(&row)
    }

    /// Whether the volunteer leads any shift of the event.
    pub async fn is_team_lead(pool: &SqlitePool, event: &str, uid: &str) -> AppResult<bool> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT id FROM shifts WHERE event = ? AND team_lead_uid = ? LIMIT 1")
                .bind(event)
                .bind(uid)
                .fetch_optional(pool)
                .await
                .map_err(AppError::Database)?;

        Ok(found.is_some())
    }

    /// Current roster, its version and the claim capacity of a shift.
    pub async fn load_roster(
        conn: &mut SqliteConnection,
        shift_id: &str,
    ) -> AppResult<(Vec<ClaimedVolunteer>, i64, i64)> {
        let row: Option<(String, i64, i64, i64)> = sqlx::query_as(
            "SELECT claimed_by, version, max_signups, overage_buffer FROM shifts WHERE id = ?",
        )
        .bind(shift_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        let (claimed_by, version, max_signups, overage_buffer) =
            row.ok_or_else(|| AppError::NotFound(crate::i18n::t("not_found.shift")))?;
        let roster: Vec<ClaimedVolunteer> = serde_json::from_str(&claimed_by)?;

        Ok((roster, version, max_signups + overage_buffer))
    }

    /// Compare-and-swap write of a whole roster. Returns false when the stored
    /// version no longer matches `expected_version`.
    pub async fn write_roster_if_version(
        conn: &mut SqliteConnection,
        shift_id: &str,
        roster: &[ClaimedVolunteer],
        expected_version: i64,
    ) -> AppResult<bool> {
        let now = Utc::now().naive_utc();
        let encoded = serde_json::to_string(roster)?;

        let result = sqlx::query(
            r#"
            UPDATE shifts
            SET claimed_by = ?, version = version + 1, updated_at = ?
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(encoded)
        .bind(now)
        .bind(shift_id)
        .bind(expected_version)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() == 1)
    }

    /// Append volunteers to a roster without losing concurrent appends.
    ///
    /// Volunteers already on the roster are skipped, so the call is idempotent.
    /// Runs on the caller's connection so it can take part in a transaction;
    /// that connection should already hold the write lock.
    pub async fn append_to_roster(
        conn: &mut SqliteConnection,
        shift_id: &str,
        additions: &[ClaimedVolunteer],
        policy: AppendPolicy,
    ) -> AppResult<RosterAppend> {
        let mut retries = 0u32;

        loop {
            let (mut roster, version, capacity) = Self::load_roster(conn, shift_id).await?;

            let mut added: Vec<ClaimedVolunteer> = Vec::new();
            for candidate in additions {
                let present = roster.iter().any(|v| v.uid == candidate.uid)
                    || added.iter().any(|v| v.uid == candidate.uid);
                if !present {
                    added.push(candidate.clone());
                }
            }

            if added.is_empty() {
                return Ok(RosterAppend {
                    added,
                    roster,
                    retries,
                });
            }

            if policy.enforce_capacity && (roster.len() + added.len()) as i64 > capacity {
                return Err(AppError::Conflict(crate::i18n::t("claim.full")));
            }

            roster.extend(added.iter().cloned());

            if Self::write_roster_if_version(conn, shift_id, &roster, version).await? {
                return Ok(RosterAppend {
                    added,
                    roster,
                    retries,
                });
            }

            if retries >= policy.max_retries {
                tracing::warn!(
                    "Giving up on roster append for shift {} after {} retries",
                    shift_id,
                    retries
                );
                return Err(AppError::Conflict(crate::i18n::t("scheduler.write_conflict")));
            }
            retries += 1;
            tracing::debug!(
                "Roster of shift {} changed underneath us (version {}), retry {}",
                shift_id,
                version,
                retries
            );
        }
    }

    /// `append_to_roster` in its own `BEGIN IMMEDIATE` transaction.
    pub async fn guarded_append(
        pool: &SqlitePool,
        shift_id: &str,
        additions: &[ClaimedVolunteer],
        policy: AppendPolicy,
    ) -> AppResult<RosterAppend> {
        let mut tx = WriteTx::begin(pool).await?;
        match Self::append_to_roster(tx.conn()?, shift_id, additions, policy).await {
            Ok(appended) => {
                tx.commit().await?;
                Ok(appended)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }
}
