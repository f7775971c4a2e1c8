use chrono::NaiveDateTime;
use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::error::{CourtsideError, Result};
use crate::models::{Assignment, Duty, ParsedAssignment, ScheduleFile};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn split_now(now: NaiveDateTime) -> (String, String) {
    (
        now.format("%Y-%m-%d").to_string(),
        now.format("%H:%M").to_string(),
    )
}

// Upcoming means today-or-later; an entry with no kickoff time stays visible
// until its day is over. Binds (today, today, now_time), in that order.
const UPCOMING_CLAUSE: &str =
    "(a.date > ? OR (a.date = ? AND (a.time IS NULL OR a.time = '' OR a.time >= ?)))";

// ---------------------------------------------------------------------------
// Schedule files
// ---------------------------------------------------------------------------

pub fn upsert_file(
    conn: &Connection,
    remote_id: &str,
    name: &str,
    folder: &str,
    checksum: Option<&str>,
    modified_time: Option<&str>,
    payment_eligible: bool,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO schedule_files (remote_id, name, folder, checksum, modified_time, payment_eligible, last_synced_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now')) \
         ON CONFLICT(remote_id) DO UPDATE SET \
            name = excluded.name, \
            folder = excluded.folder, \
            checksum = excluded.checksum, \
            modified_time = excluded.modified_time, \
            payment_eligible = excluded.payment_eligible, \
            last_synced_at = excluded.last_synced_at",
        rusqlite::params![remote_id, name, folder, checksum, modified_time, payment_eligible],
    )?;
    let id = conn.query_row(
        "SELECT id FROM schedule_files WHERE remote_id = ?1",
        [remote_id],
        |r| r.get(0),
    )?;
    Ok(id)
}

/// The file record from the previous sync, if this remote id has been seen.
pub fn find_file(conn: &Connection, remote_id: &str) -> Option<ScheduleFile> {
    conn.query_row(
        "SELECT id, remote_id, name, folder, checksum, modified_time, payment_eligible, last_synced_at \
         FROM schedule_files WHERE remote_id = ?1",
        [remote_id],
        |row| {
            Ok(ScheduleFile {
                id: row.get(0)?,
                remote_id: row.get(1)?,
                name: row.get(2)?,
                folder: row.get(3)?,
                checksum: row.get(4)?,
                modified_time: row.get(5)?,
                payment_eligible: row.get(6)?,
                last_synced_at: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            })
        },
    )
    .ok()
}

pub fn list_files(conn: &Connection) -> Result<Vec<ScheduleFile>> {
    let mut stmt = conn.prepare(
        "SELECT id, remote_id, name, folder, checksum, modified_time, payment_eligible, last_synced_at \
         FROM schedule_files ORDER BY folder, name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(ScheduleFile {
            id: row.get(0)?,
            remote_id: row.get(1)?,
            name: row.get(2)?,
            folder: row.get(3)?,
            checksum: row.get(4)?,
            modified_time: row.get(5)?,
            payment_eligible: row.get(6)?,
            last_synced_at: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Assignments
// ---------------------------------------------------------------------------

const ASSIGNMENT_COLS: &str =
    "a.id, a.key, a.date, a.time, a.venue, a.home_team, a.away_team, a.duty, \
     f.name, COALESCE(f.payment_eligible, 0), a.is_paid, a.paid_at, a.notified, a.first_seen_at";

fn row_to_assignment(row: &rusqlite::Row) -> rusqlite::Result<Assignment> {
    let duty_key: String = row.get(7)?;
    let duty = Duty::from_key(&duty_key).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            format!("unknown duty: {duty_key}").into(),
        )
    })?;
    Ok(Assignment {
        id: row.get(0)?,
        key: row.get(1)?,
        date: row.get(2)?,
        time: row.get(3)?,
        venue: row.get(4)?,
        home_team: row.get(5)?,
        away_team: row.get(6)?,
        duty,
        file_name: row.get(8)?,
        payment_eligible: row.get(9)?,
        is_paid: row.get(10)?,
        paid_at: row.get(11)?,
        notified: row.get(12)?,
        first_seen_at: row.get::<_, Option<String>>(13)?.unwrap_or_default(),
    })
}

pub struct UpsertStats {
    pub new_ids: Vec<i64>,
    pub updated: usize,
}

/// Record scanned assignments under their composite key. Existing rows keep
/// their payment and notification flags; only the fields a re-published sheet
/// can legitimately change are refreshed.
pub fn upsert_assignments(
    conn: &Connection,
    file_id: i64,
    parsed: &[ParsedAssignment],
) -> Result<UpsertStats> {
    let mut stats = UpsertStats {
        new_ids: Vec::new(),
        updated: 0,
    };
    for a in parsed {
        let key = a.key();
        let existing: Option<i64> = conn
            .query_row("SELECT id FROM assignments WHERE key = ?1", [&key], |r| r.get(0))
            .ok();
        if let Some(id) = existing {
            conn.execute(
                "UPDATE assignments SET venue = ?1, file_id = ?2, last_seen_at = datetime('now') WHERE id = ?3",
                rusqlite::params![a.venue, file_id, id],
            )?;
            stats.updated += 1;
        } else {
            conn.execute(
                "INSERT INTO assignments (key, date, time, venue, home_team, away_team, duty, file_id, last_seen_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))",
                rusqlite::params![
                    key,
                    a.date,
                    a.time,
                    a.venue,
                    a.home_team,
                    a.away_team,
                    a.duty.key(),
                    file_id,
                ],
            )?;
            stats.new_ids.push(conn.last_insert_rowid());
        }
    }
    Ok(stats)
}

pub fn list_assignments(
    conn: &Connection,
    include_past: bool,
    unpaid_only: bool,
    month: Option<&str>,
    duty: Option<Duty>,
    now: NaiveDateTime,
) -> Result<Vec<Assignment>> {
    let (today, now_time) = split_now(now);
    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<String> = Vec::new();
    if !include_past {
        clauses.push(UPCOMING_CLAUSE);
        params.push(today.clone());
        params.push(today);
        params.push(now_time);
    }
    if unpaid_only {
        clauses.push("COALESCE(f.payment_eligible, 0) = 1 AND a.is_paid = 0");
    }
    if let Some(month) = month {
        clauses.push("a.date LIKE ?");
        params.push(format!("{month}%"));
    }
    if let Some(duty) = duty {
        clauses.push("a.duty = ?");
        params.push(duty.key().to_string());
    }
    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {ASSIGNMENT_COLS} FROM assignments a \
         LEFT JOIN schedule_files f ON a.file_id = f.id \
         {where_clause} ORDER BY a.date, a.time, a.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let param_values: Vec<&dyn rusqlite::types::ToSql> = params
        .iter()
        .map(|p| p as &dyn rusqlite::types::ToSql)
        .collect();
    let rows = stmt.query_map(param_values.as_slice(), row_to_assignment)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn get_assignment(conn: &Connection, id: i64) -> Result<Assignment> {
    let sql = format!(
        "SELECT {ASSIGNMENT_COLS} FROM assignments a \
         LEFT JOIN schedule_files f ON a.file_id = f.id WHERE a.id = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([id], row_to_assignment)
        .map_err(|_| CourtsideError::UnknownAssignment(id))
}

/// Flip the paid flag. Marking paid is only allowed for assignments that came
/// from a payment-eligible file; clearing is always allowed.
pub fn set_paid(conn: &Connection, id: i64, paid: bool) -> Result<Assignment> {
    let a = get_assignment(conn, id)?;
    if paid && !a.payment_eligible {
        return Err(CourtsideError::NotPaymentEligible(id));
    }
    if paid {
        conn.execute(
            "UPDATE assignments SET is_paid = 1, paid_at = datetime('now') WHERE id = ?1",
            [id],
        )?;
    } else {
        conn.execute(
            "UPDATE assignments SET is_paid = 0, paid_at = NULL WHERE id = ?1",
            [id],
        )?;
    }
    get_assignment(conn, id)
}

/// Upcoming assignments that never went out over WhatsApp. Covers rows from
/// older syncs too, so an interrupted run gets retried on the next one.
pub fn unnotified_upcoming(conn: &Connection, now: NaiveDateTime) -> Result<Vec<Assignment>> {
    let (today, now_time) = split_now(now);
    let sql = format!(
        "SELECT {ASSIGNMENT_COLS} FROM assignments a \
         LEFT JOIN schedule_files f ON a.file_id = f.id \
         WHERE a.notified = 0 AND {UPCOMING_CLAUSE} ORDER BY a.date, a.time, a.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params![today, today, now_time], row_to_assignment)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn mark_notified(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("UPDATE assignments SET notified = 1 WHERE id = ?1", [id])?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Counts for the status view
// ---------------------------------------------------------------------------

pub struct RegisterCounts {
    pub files: i64,
    pub assignments: i64,
    pub upcoming: i64,
    pub unpaid: i64,
}

pub fn counts(conn: &Connection, now: NaiveDateTime) -> Result<RegisterCounts> {
    let (today, now_time) = split_now(now);
    let files: i64 = conn.query_row("SELECT count(*) FROM schedule_files", [], |r| r.get(0))?;
    let assignments: i64 = conn.query_row("SELECT count(*) FROM assignments", [], |r| r.get(0))?;
    let upcoming: i64 = conn.query_row(
        &format!("SELECT count(*) FROM assignments a WHERE {UPCOMING_CLAUSE}"),
        rusqlite::params![today, today, now_time],
        |r| r.get(0),
    )?;
    let unpaid: i64 = conn.query_row(
        "SELECT count(*) FROM assignments a \
         LEFT JOIN schedule_files f ON a.file_id = f.id \
         WHERE COALESCE(f.payment_eligible, 0) = 1 AND a.is_paid = 0",
        [],
        |r| r.get(0),
    )?;
    Ok(RegisterCounts {
        files,
        assignments,
        upcoming,
        unpaid,
    })
}
