//! Storage-neutral calendar event types.
//!
//! These types carry iCalendar VEVENT semantics independently of the row
//! schema. The row codec in `rows` converts between this model and the
//! relational form; sync adapters and importers work exclusively with it.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::alarm::AlarmTrigger;
use crate::attendee::{Attendee, Organizer};

/// A calendar event (storage-neutral)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// iCalendar UID; generated on first persist when absent
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    /// Never before `start`. Inclusive for all-day events at this layer.
    pub end: EventTime,

    // Recurrence fields, carried verbatim and never interpreted here
    pub rrule: Option<String>,
    pub rdate: Option<String>,
    pub exrule: Option<String>,
    pub exdate: Option<String>,

    /// Event organizer
    pub organizer: Option<Organizer>,
    /// Event attendees/participants
    pub attendees: Vec<Attendee>,
    /// Alarms for this event
    pub alarms: Vec<AlarmTrigger>,
}

impl Event {
    /// An empty event spanning the given times.
    pub fn new(start: EventTime, end: EventTime) -> Event {
        Event {
            uid: None,
            summary: None,
            description: None,
            location: None,
            start,
            end,
            rrule: None,
            rdate: None,
            exrule: None,
            exdate: None,
            organizer: None,
            attendees: Vec::new(),
            alarms: Vec::new(),
        }
    }

    /// True iff both start and end are date-only.
    pub fn is_all_day(&self) -> bool {
        self.start.is_date_only() && self.end.is_date_only()
    }
}

/// An event time in one of the four iCalendar forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    /// All-day date: no time-of-day, no zone
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    /// Wall-clock time with no zone attached
    DateTimeFloating(NaiveDateTime),
    /// Wall-clock time in a named IANA zone
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl EventTime {
    pub fn is_date_only(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// Resolve to a UTC instant. Date-only times and unresolvable zones
    /// return None; floating times are read as UTC.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            EventTime::Date(_) => None,
            EventTime::DateTimeUtc(dt) => Some(*dt),
            EventTime::DateTimeFloating(dt) => Some(dt.and_utc()),
            EventTime::DateTimeZoned { datetime, tzid } => {
                let tz: Tz = tzid.parse().ok()?;
                tz.from_local_datetime(datetime)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
            }
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
            EventTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            EventTime::DateTimeZoned { datetime, tzid } => {
                write!(f, "{} {}", datetime.format("%Y-%m-%d %H:%M"), tzid)
            }
        }
    }
}
