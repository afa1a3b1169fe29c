//! Storage collaborators.
//!
//! [`RowProvider`] is the boundary to the relational store: a transactional
//! batch primitive plus row reads over named tables. The store facade
//! speaks only this trait; `sqlite` is the bundled implementation.

pub mod sqlite;

pub use sqlite::SqliteProvider;

use crate::error::StoreResult;
use crate::rows::{AlarmRow, AttendeeRow, CalendarId, EventId, EventRow};

/// A calendar container row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarRow {
    pub id: CalendarId,
    pub account: String,
    pub name: String,
}

/// Placeholder for a parent row id inside a batch.
///
/// Child-row operations may reference a parent inserted earlier in the same
/// batch, before its id is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    /// An already-persisted event.
    Existing(EventId),
    /// The event inserted by a preceding `InsertEvent` in this batch.
    Inserted,
}

/// One element of a transactional row batch.
///
/// Parent-row mutations are scoped to the owning calendar: an id from
/// another calendar does not match and fails the exactly-one check.
#[derive(Debug, Clone)]
pub enum RowOp {
    InsertEvent(EventRow),
    UpdateEvent { id: EventId, row: EventRow },
    DeleteEvent { calendar: CalendarId, id: EventId },
    /// Remove all alarm and attendee rows of one event.
    ClearChildren { event: ParentRef },
    InsertAlarm { event: ParentRef, row: AlarmRow },
    InsertAttendee { event: ParentRef, row: AttendeeRow },
    /// Clear the dirty marker after a successful upload.
    ClearDirty { calendar: CalendarId, id: EventId },
}

/// Selection filter for event queries. The default matches every event in
/// the calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSelection {
    /// Match a specific iCalendar UID.
    pub uid: Option<String>,
    /// Match only dirty (or only clean) events.
    pub dirty: Option<bool>,
}

/// Boundary to the row store.
///
/// `apply` runs one batch in one transaction. `UpdateEvent`, `DeleteEvent`
/// and `ClearDirty` must affect exactly one row each; otherwise the whole
/// batch fails with `NotFound` and rolls back. A `ParentRef::Inserted` with
/// no preceding `InsertEvent` fails the batch with a storage fault.
pub trait RowProvider: Send + Sync {
    fn find_calendar(&self, account: &str, name: &str) -> StoreResult<Option<CalendarRow>>;
    fn create_calendar(&self, account: &str, name: &str) -> StoreResult<CalendarId>;
    /// Remove a calendar row. Whether it may still own events is the
    /// caller's contract, not this layer's.
    fn delete_calendar(&self, id: CalendarId) -> StoreResult<()>;
    fn count_events(&self, calendar: CalendarId) -> StoreResult<u64>;

    /// Apply a batch of row operations in one transaction, returning the id
    /// assigned by the batch's `InsertEvent` if it had one.
    fn apply(&self, ops: &[RowOp]) -> StoreResult<Option<EventId>>;

    fn event_row(&self, calendar: CalendarId, id: EventId) -> StoreResult<Option<EventRow>>;
    /// Matching parent rows in storage order (stable within one call).
    fn query_events(
        &self,
        calendar: CalendarId,
        selection: &EventSelection,
    ) -> StoreResult<Vec<(EventId, EventRow)>>;
    fn alarm_rows(&self, event: EventId) -> StoreResult<Vec<AlarmRow>>;
    fn attendee_rows(&self, event: EventId) -> StoreResult<Vec<AttendeeRow>>;
}
