//! Event to row-set encoding.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{StoreError, StoreResult};
use crate::event::{Event, EventTime};
use crate::rows::{AlarmRow, AttendeeRow, CalendarId, EventRow, RowSet, allday};

/// Encode an event into the full row set persisting it in one calendar.
///
/// The parent row is always written dirty; clearing the marker is the
/// store's job after a successful upload, never the codec's. The zone
/// column records the start's zone; the end is stored as its resolved
/// instant (storage keeps one zone per event).
pub fn encode_event(calendar_id: CalendarId, event: &Event) -> StoreResult<RowSet> {
    let all_day = event.is_all_day();

    let (dtstart, dtend) = if let (EventTime::Date(start), EventTime::Date(end)) =
        (&event.start, &event.end)
    {
        let (start, end_exclusive) = allday::to_storage_range(*start, *end);
        (date_millis(start), date_millis(end_exclusive))
    } else {
        (instant_millis(&event.start)?, instant_millis(&event.end)?)
    };

    let parent = EventRow {
        calendar_id,
        uid: event.uid.clone(),
        title: event.summary.clone(),
        description: event.description.clone(),
        location: event.location.clone(),
        dtstart,
        dtend,
        all_day,
        tz: zone_of(&event.start),
        rrule: event.rrule.clone(),
        rdate: event.rdate.clone(),
        exrule: event.exrule.clone(),
        exdate: event.exdate.clone(),
        dirty: true,
    };

    let start_instant = DateTime::from_timestamp_millis(dtstart)
        .ok_or_else(|| StoreError::MalformedRow(format!("start out of range: {dtstart}")))?;

    let alarms = event
        .alarms
        .iter()
        .map(|trigger| {
            let (minutes, relative) = trigger.to_storage_minutes(start_instant);
            AlarmRow { minutes, relative }
        })
        .collect();

    // One row per attendee plus a marked row for the organizer. Both rows
    // are written even when the organizer address is also an attendee.
    let mut attendees: Vec<AttendeeRow> = Vec::with_capacity(event.attendees.len() + 1);
    if let Some(organizer) = &event.organizer {
        attendees.push(AttendeeRow {
            email: organizer.email.clone(),
            name: organizer.name.clone(),
            role: None,
            status: None,
            organizer: true,
        });
    }
    for attendee in &event.attendees {
        attendees.push(AttendeeRow {
            email: attendee.email.clone(),
            name: attendee.name.clone(),
            role: attendee.role.map(|r| r.as_ics_str().to_string()),
            status: attendee.status.map(|s| s.as_ics_str().to_string()),
            organizer: false,
        });
    }

    Ok(RowSet {
        parent,
        alarms,
        attendees,
    })
}

fn date_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Resolve any event time to its UTC instant in epoch milliseconds.
/// All-day dates resolve to midnight UTC.
fn instant_millis(time: &EventTime) -> StoreResult<i64> {
    match time {
        EventTime::Date(d) => Ok(date_millis(*d)),
        EventTime::DateTimeUtc(dt) => Ok(dt.timestamp_millis()),
        EventTime::DateTimeFloating(dt) => Ok(dt.and_utc().timestamp_millis()),
        EventTime::DateTimeZoned { datetime, tzid } => {
            let tz: Tz = tzid
                .parse()
                .map_err(|_| StoreError::MalformedRow(format!("unknown time zone: {tzid}")))?;
            let resolved = tz.from_local_datetime(datetime).earliest().ok_or_else(|| {
                StoreError::MalformedRow(format!("nonexistent local time {datetime} in {tzid}"))
            })?;
            Ok(resolved.with_timezone(&Utc).timestamp_millis())
        }
    }
}

fn zone_of(time: &EventTime) -> Option<String> {
    match time {
        EventTime::Date(_) | EventTime::DateTimeFloating(_) => None,
        EventTime::DateTimeUtc(_) => Some("UTC".to_string()),
        EventTime::DateTimeZoned { tzid, .. } => Some(tzid.clone()),
    }
}
