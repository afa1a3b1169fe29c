//! Row-level representation of persisted events.
//!
//! One parent row per event plus child rows for alarms and attendees,
//! mirroring the relational schema. The codec here converts between
//! [`Event`](crate::event::Event) and these rows in both directions; it
//! never touches storage itself, and fails only on malformed input.

pub mod allday;
mod decode;
mod encode;

pub use decode::decode_event;
pub use encode::encode_event;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a calendar row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarId(pub i64);

/// Identifier of a persisted event's parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub i64);

impl fmt::Display for CalendarId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The parent row of one persisted event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub calendar_id: CalendarId,
    pub uid: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Start instant, epoch milliseconds UTC
    pub dtstart: i64,
    /// End instant, epoch milliseconds UTC; exclusive next-day midnight
    /// for all-day events
    pub dtend: i64,
    pub all_day: bool,
    /// IANA zone name; None for all-day and floating times
    pub tz: Option<String>,
    pub rrule: Option<String>,
    pub rdate: Option<String>,
    pub exrule: Option<String>,
    pub exdate: Option<String>,
    /// Local changes not yet pushed to a remote
    pub dirty: bool,
}

/// One alarm child row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmRow {
    /// Signed trigger offset in whole minutes
    pub minutes: i64,
    /// True when the offset is relative to the event start
    pub relative: bool,
}

/// One attendee child row. The organizer is stored as a marked row in the
/// same table, independent of any attendee row with the same address.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendeeRow {
    pub email: String,
    pub name: Option<String>,
    /// ICS role code (REQ-PARTICIPANT etc.)
    pub role: Option<String>,
    /// ICS participation status code (ACCEPTED etc.)
    pub status: Option<String>,
    pub organizer: bool,
}

/// The full set of rows representing one event.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    pub parent: EventRow,
    pub alarms: Vec<AlarmRow>,
    pub attendees: Vec<AttendeeRow>,
}
