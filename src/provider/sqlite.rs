//! SQLite-backed row provider.
//!
//! One connection behind a mutex; every batch runs in a single transaction.
//! Schema changes are versioned SQL batches gated by the `user_version`
//! pragma. Child tables cascade from events; the calendars-to-events edge
//! deliberately does not cascade, so an occupied calendar cannot be dropped
//! behind the facade's back.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::provider::{CalendarRow, EventSelection, ParentRef, RowOp, RowProvider};
use crate::rows::{AlarmRow, AttendeeRow, CalendarId, EventId, EventRow};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Applied in order; `user_version` records the last one run.
const MIGRATIONS: &[(i32, &str)] = &[(1, MIGRATION_V1_SQL)];

const MIGRATION_V1_SQL: &str = "
CREATE TABLE calendars (
    id          INTEGER PRIMARY KEY,
    account     TEXT NOT NULL,
    name        TEXT NOT NULL,
    UNIQUE (account, name)
);

CREATE TABLE events (
    id          INTEGER PRIMARY KEY,
    calendar_id INTEGER NOT NULL REFERENCES calendars(id),
    uid         TEXT,
    title       TEXT,
    description TEXT,
    location    TEXT,
    dtstart     INTEGER NOT NULL,
    dtend       INTEGER NOT NULL,
    all_day     INTEGER NOT NULL DEFAULT 0 CHECK (all_day IN (0, 1)),
    tz          TEXT,
    rrule       TEXT,
    rdate       TEXT,
    exrule      TEXT,
    exdate      TEXT,
    dirty       INTEGER NOT NULL DEFAULT 1 CHECK (dirty IN (0, 1))
);

CREATE INDEX idx_events_calendar ON events(calendar_id);
CREATE INDEX idx_events_uid ON events(calendar_id, uid);

CREATE TABLE alarms (
    id          INTEGER PRIMARY KEY,
    event_id    INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    minutes     INTEGER NOT NULL,
    relative    INTEGER NOT NULL DEFAULT 1 CHECK (relative IN (0, 1))
);

CREATE INDEX idx_alarms_event ON alarms(event_id);

CREATE TABLE attendees (
    id          INTEGER PRIMARY KEY,
    event_id    INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    email       TEXT NOT NULL,
    name        TEXT,
    role        TEXT,
    status      TEXT,
    organizer   INTEGER NOT NULL DEFAULT 0 CHECK (organizer IN (0, 1))
);

CREATE INDEX idx_attendees_event ON attendees(event_id);
";

/// Row provider over a single SQLite connection.
pub struct SqliteProvider {
    conn: Mutex<Connection>,
}

impl SqliteProvider {
    /// Open (creating if needed) the database at `path`, including parent
    /// directories.
    pub fn open(path: &Path) -> StoreResult<SqliteProvider> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(path)?;
        configure_connection(&conn)?;
        migrate(&mut conn)?;
        debug!(path = %path.display(), "opened event store database");
        Ok(SqliteProvider {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> StoreResult<SqliteProvider> {
        let mut conn = Connection::open_in_memory()?;
        configure_connection(&conn)?;
        migrate(&mut conn)?;
        Ok(SqliteProvider {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Fault("connection lock poisoned"))
    }
}

fn configure_connection(conn: &Connection) -> StoreResult<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

fn migrate(conn: &mut Connection) -> StoreResult<()> {
    let current: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    for (version, sql) in MIGRATIONS {
        if i64::from(*version) <= current {
            continue;
        }
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", i64::from(*version))?;
        tx.commit()?;
        debug!(version, "applied schema migration");
    }

    Ok(())
}

impl RowProvider for SqliteProvider {
    fn find_calendar(&self, account: &str, name: &str) -> StoreResult<Option<CalendarRow>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, account, name FROM calendars WHERE account = ?1 AND name = ?2",
                params![account, name],
                |row| {
                    Ok(CalendarRow {
                        id: CalendarId(row.get(0)?),
                        account: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn create_calendar(&self, account: &str, name: &str) -> StoreResult<CalendarId> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO calendars (account, name) VALUES (?1, ?2)",
            params![account, name],
        )?;
        Ok(CalendarId(conn.last_insert_rowid()))
    }

    fn delete_calendar(&self, id: CalendarId) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM calendars WHERE id = ?1", params![id.0])?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("calendar {id}")));
        }
        Ok(())
    }

    fn count_events(&self, calendar: CalendarId) -> StoreResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE calendar_id = ?1",
            params![calendar.0],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn apply(&self, ops: &[RowOp]) -> StoreResult<Option<EventId>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted: Option<EventId> = None;

        for op in ops {
            match op {
                RowOp::InsertEvent(row) => {
                    tx.execute(
                        "INSERT INTO events (calendar_id, uid, title, description, location, \
                         dtstart, dtend, all_day, tz, rrule, rdate, exrule, exdate, dirty) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                        params![
                            row.calendar_id.0,
                            row.uid,
                            row.title,
                            row.description,
                            row.location,
                            row.dtstart,
                            row.dtend,
                            row.all_day,
                            row.tz,
                            row.rrule,
                            row.rdate,
                            row.exrule,
                            row.exdate,
                            row.dirty,
                        ],
                    )?;
                    inserted = Some(EventId(tx.last_insert_rowid()));
                }
                RowOp::UpdateEvent { id, row } => {
                    // Scoped to the row's calendar; updates never re-parent
                    let changed = tx.execute(
                        "UPDATE events SET uid = ?1, title = ?2, description = ?3, \
                         location = ?4, dtstart = ?5, dtend = ?6, all_day = ?7, tz = ?8, \
                         rrule = ?9, rdate = ?10, exrule = ?11, exdate = ?12, dirty = ?13 \
                         WHERE id = ?14 AND calendar_id = ?15",
                        params![
                            row.uid,
                            row.title,
                            row.description,
                            row.location,
                            row.dtstart,
                            row.dtend,
                            row.all_day,
                            row.tz,
                            row.rrule,
                            row.rdate,
                            row.exrule,
                            row.exdate,
                            row.dirty,
                            id.0,
                            row.calendar_id.0,
                        ],
                    )?;
                    expect_one(changed, *id)?;
                }
                RowOp::DeleteEvent { calendar, id } => {
                    let changed = tx.execute(
                        "DELETE FROM events WHERE id = ?1 AND calendar_id = ?2",
                        params![id.0, calendar.0],
                    )?;
                    expect_one(changed, *id)?;
                }
                RowOp::ClearChildren { event } => {
                    let id = resolve(*event, inserted)?;
                    tx.execute("DELETE FROM alarms WHERE event_id = ?1", params![id.0])?;
                    tx.execute("DELETE FROM attendees WHERE event_id = ?1", params![id.0])?;
                }
                RowOp::InsertAlarm { event, row } => {
                    let id = resolve(*event, inserted)?;
                    tx.execute(
                        "INSERT INTO alarms (event_id, minutes, relative) VALUES (?1, ?2, ?3)",
                        params![id.0, row.minutes, row.relative],
                    )?;
                }
                RowOp::InsertAttendee { event, row } => {
                    let id = resolve(*event, inserted)?;
                    tx.execute(
                        "INSERT INTO attendees (event_id, email, name, role, status, organizer) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![id.0, row.email, row.name, row.role, row.status, row.organizer],
                    )?;
                }
                RowOp::ClearDirty { calendar, id } => {
                    let changed = tx.execute(
                        "UPDATE events SET dirty = 0 WHERE id = ?1 AND calendar_id = ?2",
                        params![id.0, calendar.0],
                    )?;
                    expect_one(changed, *id)?;
                }
            }
        }

        tx.commit()?;
        debug!(ops = ops.len(), "applied row batch");
        Ok(inserted)
    }

    fn event_row(&self, calendar: CalendarId, id: EventId) -> StoreResult<Option<EventRow>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1 AND calendar_id = ?2"),
                params![id.0, calendar.0],
                row_to_event,
            )
            .optional()?;
        Ok(row)
    }

    fn query_events(
        &self,
        calendar: CalendarId,
        selection: &EventSelection,
    ) -> StoreResult<Vec<(EventId, EventRow)>> {
        let conn = self.lock()?;

        let mut sql = format!("SELECT id, {EVENT_COLUMNS} FROM events WHERE calendar_id = ?1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(calendar.0)];

        if let Some(uid) = &selection.uid {
            param_values.push(Box::new(uid.clone()));
            sql.push_str(&format!(" AND uid = ?{}", param_values.len()));
        }
        if let Some(dirty) = selection.dirty {
            param_values.push(Box::new(dirty));
            sql.push_str(&format!(" AND dirty = ?{}", param_values.len()));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(AsRef::as_ref).collect();

        let rows = stmt.query_map(params_from_iter(params_ref), |row| {
            // Columns shift by one for the leading id
            Ok((
                EventId(row.get(0)?),
                EventRow {
                    calendar_id: CalendarId(row.get(1)?),
                    uid: row.get(2)?,
                    title: row.get(3)?,
                    description: row.get(4)?,
                    location: row.get(5)?,
                    dtstart: row.get(6)?,
                    dtend: row.get(7)?,
                    all_day: row.get(8)?,
                    tz: row.get(9)?,
                    rrule: row.get(10)?,
                    rdate: row.get(11)?,
                    exrule: row.get(12)?,
                    exdate: row.get(13)?,
                    dirty: row.get(14)?,
                },
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn alarm_rows(&self, event: EventId) -> StoreResult<Vec<AlarmRow>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT minutes, relative FROM alarms WHERE event_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![event.0], |row| {
            Ok(AlarmRow {
                minutes: row.get(0)?,
                relative: row.get(1)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn attendee_rows(&self, event: EventId) -> StoreResult<Vec<AttendeeRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT email, name, role, status, organizer FROM attendees \
             WHERE event_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![event.0], |row| {
            Ok(AttendeeRow {
                email: row.get(0)?,
                name: row.get(1)?,
                role: row.get(2)?,
                status: row.get(3)?,
                organizer: row.get(4)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

const EVENT_COLUMNS: &str = "calendar_id, uid, title, description, location, dtstart, dtend, \
                             all_day, tz, rrule, rdate, exrule, exdate, dirty";

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        calendar_id: CalendarId(row.get(0)?),
        uid: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        dtstart: row.get(5)?,
        dtend: row.get(6)?,
        all_day: row.get(7)?,
        tz: row.get(8)?,
        rrule: row.get(9)?,
        rdate: row.get(10)?,
        exrule: row.get(11)?,
        exdate: row.get(12)?,
        dirty: row.get(13)?,
    })
}

fn resolve(event: ParentRef, inserted: Option<EventId>) -> StoreResult<EventId> {
    match event {
        ParentRef::Existing(id) => Ok(id),
        ParentRef::Inserted => {
            inserted.ok_or(StoreError::Fault("back-reference before any parent insert"))
        }
    }
}

fn expect_one(changed: usize, id: EventId) -> StoreResult<()> {
    if changed == 1 {
        Ok(())
    } else {
        Err(StoreError::NotFound(format!("event row {id}")))
    }
}
