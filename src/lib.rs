//! Local calendar event store.
//!
//! Events carry iCalendar VEVENT semantics (times in four forms, alarms,
//! attendees, opaque recurrence blobs) and persist into a row-oriented
//! SQLite schema: one parent row per event plus alarm and attendee child
//! rows. The codec in `rows` keeps the two representations round-trip
//! convertible; [`Calendar`] exposes add/update/delete/query over it and
//! owns the dirty/synced lifecycle driven by external sync adapters.

pub mod alarm;
pub mod attendee;
pub mod calendar;
pub mod config;
pub mod error;
pub mod event;
pub mod ical;
pub mod provider;
pub mod rows;

pub use alarm::AlarmTrigger;
pub use attendee::{Attendee, AttendeeRole, Organizer, ParticipationStatus};
pub use calendar::{Calendar, StoredEvent, SyncState};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use event::{Event, EventTime};
pub use ical::parse_event;
pub use provider::{EventSelection, RowProvider, SqliteProvider};
pub use rows::{CalendarId, EventId};
