//! Row-set to event decoding.

use chrono::DateTime;
use chrono_tz::Tz;

use crate::alarm::AlarmTrigger;
use crate::attendee::{Attendee, AttendeeRole, Organizer, ParticipationStatus};
use crate::error::{StoreError, StoreResult};
use crate::event::{Event, EventTime};
use crate::rows::{EventRow, RowSet, allday};

/// Decode a row set back into an event. Exact inverse of
/// [`encode_event`](crate::rows::encode_event).
///
/// Zero child rows decode to empty sequences. The dirty marker is never
/// read here; sync state belongs to the store facade. More than one
/// organizer row is a data-integrity error, surfaced rather than collapsed.
pub fn decode_event(rows: &RowSet) -> StoreResult<Event> {
    let parent = &rows.parent;
    let (start, end) = decode_times(parent)?;

    let alarms = rows
        .alarms
        .iter()
        .map(|row| AlarmTrigger::from_storage_minutes(row.minutes, row.relative))
        .collect();

    let mut organizer = None;
    let mut attendees = Vec::new();
    for row in &rows.attendees {
        if row.organizer {
            if organizer.is_some() {
                return Err(StoreError::MalformedRow(format!(
                    "multiple organizer rows (second address: {})",
                    row.email
                )));
            }
            organizer = Some(Organizer {
                name: row.name.clone(),
                email: row.email.clone(),
            });
        } else {
            attendees.push(Attendee {
                name: row.name.clone(),
                email: row.email.clone(),
                role: row.role.as_deref().and_then(AttendeeRole::from_ics_str),
                status: row
                    .status
                    .as_deref()
                    .and_then(ParticipationStatus::from_ics_str),
            });
        }
    }

    Ok(Event {
        uid: parent.uid.clone(),
        summary: parent.title.clone(),
        description: parent.description.clone(),
        location: parent.location.clone(),
        start,
        end,
        rrule: parent.rrule.clone(),
        rdate: parent.rdate.clone(),
        exrule: parent.exrule.clone(),
        exdate: parent.exdate.clone(),
        organizer,
        attendees,
        alarms,
    })
}

/// Rebuild both event times from the parent row, keyed on the all-day flag
/// and the zone column. Both endpoints come back in the start's form.
fn decode_times(parent: &EventRow) -> StoreResult<(EventTime, EventTime)> {
    let start = DateTime::from_timestamp_millis(parent.dtstart).ok_or_else(|| {
        StoreError::MalformedRow(format!("start timestamp out of range: {}", parent.dtstart))
    })?;
    let end = DateTime::from_timestamp_millis(parent.dtend).ok_or_else(|| {
        StoreError::MalformedRow(format!("end timestamp out of range: {}", parent.dtend))
    })?;

    if parent.all_day {
        let (start_date, end_date) =
            allday::from_storage_range(start.date_naive(), end.date_naive());
        return Ok((EventTime::Date(start_date), EventTime::Date(end_date)));
    }

    match parent.tz.as_deref() {
        None => Ok((
            EventTime::DateTimeFloating(start.naive_utc()),
            EventTime::DateTimeFloating(end.naive_utc()),
        )),
        Some("UTC") => Ok((EventTime::DateTimeUtc(start), EventTime::DateTimeUtc(end))),
        Some(tzid) => {
            let tz: Tz = tzid
                .parse()
                .map_err(|_| StoreError::MalformedRow(format!("unknown time zone: {tzid}")))?;
            Ok((
                EventTime::DateTimeZoned {
                    datetime: start.with_timezone(&tz).naive_local(),
                    tzid: tzid.to_string(),
                },
                EventTime::DateTimeZoned {
                    datetime: end.with_timezone(&tz).naive_local(),
                    tzid: tzid.to_string(),
                },
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendee::Organizer;
    use crate::event::Event;
    use crate::rows::{AlarmRow, AttendeeRow, CalendarId, encode_event};
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn timed_event() -> Event {
        Event::new(
            EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()),
            EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2025, 5, 1, 13, 0, 0).unwrap()),
        )
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let mut event = timed_event();
        event.uid = Some("roundtrip-1".to_string());
        event.summary = Some("Team sync".to_string());
        event.description = Some("Weekly".to_string());
        event.location = Some("Room 4".to_string());
        event.rrule = Some("FREQ=WEEKLY;BYDAY=MO".to_string());
        event.alarms.push(AlarmTrigger::Relative(Duration::minutes(-15)));
        event.organizer = Some(Organizer {
            name: None,
            email: "boss@example.com".to_string(),
        });

        let rows = encode_event(CalendarId(7), &event).unwrap();
        let decoded = decode_event(&rows).unwrap();

        assert_eq!(decoded, event);
    }

    #[test]
    fn test_zoned_roundtrip_keeps_wall_clock_and_tzid() {
        let local = NaiveDate::from_ymd_opt(2025, 7, 4)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let event = Event::new(
            EventTime::DateTimeZoned {
                datetime: local,
                tzid: "Europe/Vienna".to_string(),
            },
            EventTime::DateTimeZoned {
                datetime: local + Duration::hours(2),
                tzid: "Europe/Vienna".to_string(),
            },
        );

        let rows = encode_event(CalendarId(1), &event).unwrap();
        let decoded = decode_event(&rows).unwrap();
        assert_eq!(decoded.start, event.start);
        assert_eq!(decoded.end, event.end);
    }

    #[test]
    fn test_all_day_storage_range_reads_back_inclusive() {
        let date = NaiveDate::from_ymd_opt(2015, 5, 1).unwrap();
        let event = Event::new(EventTime::Date(date), EventTime::Date(date));

        let rows = encode_event(CalendarId(1), &event).unwrap();
        let decoded = decode_event(&rows).unwrap();

        assert_eq!(decoded.start, EventTime::Date(date));
        assert_eq!(decoded.end, EventTime::Date(date), "exclusive end shrinks back");
    }

    #[test]
    fn test_zero_child_rows_decode_to_empty_sequences() {
        let rows = encode_event(CalendarId(1), &timed_event()).unwrap();
        let decoded = decode_event(&rows).unwrap();
        assert!(decoded.alarms.is_empty());
        assert!(decoded.attendees.is_empty());
        assert!(decoded.organizer.is_none());
    }

    #[test]
    fn test_multiple_organizer_rows_are_malformed() {
        let mut rows = encode_event(CalendarId(1), &timed_event()).unwrap();
        for email in ["a@example.com", "b@example.com"] {
            rows.attendees.push(AttendeeRow {
                email: email.to_string(),
                name: None,
                role: None,
                status: None,
                organizer: true,
            });
        }

        let err = decode_event(&rows).unwrap_err();
        assert!(matches!(err, StoreError::MalformedRow(_)));
    }

    #[test]
    fn test_unknown_role_code_decodes_as_absent() {
        let mut rows = encode_event(CalendarId(1), &timed_event()).unwrap();
        rows.attendees.push(AttendeeRow {
            email: "x@example.com".to_string(),
            name: None,
            role: Some("DELEGATE".to_string()),
            status: Some("IN-PROCESS".to_string()),
            organizer: false,
        });

        let decoded = decode_event(&rows).unwrap();
        assert_eq!(decoded.attendees.len(), 1);
        assert_eq!(decoded.attendees[0].role, None);
        assert_eq!(decoded.attendees[0].status, None);
    }

    #[test]
    fn test_alarm_rows_decode_flag_aware() {
        let mut rows = encode_event(CalendarId(1), &timed_event()).unwrap();
        rows.alarms.push(AlarmRow {
            minutes: -1563,
            relative: true,
        });
        rows.alarms.push(AlarmRow {
            minutes: 30,
            relative: false,
        });

        let decoded = decode_event(&rows).unwrap();
        assert_eq!(
            decoded.alarms,
            vec![
                AlarmTrigger::Relative(Duration::minutes(-1563)),
                AlarmTrigger::Relative(Duration::minutes(-30)),
            ]
        );
    }

    #[test]
    fn test_unknown_zone_in_row_is_malformed() {
        let mut rows = encode_event(CalendarId(1), &timed_event()).unwrap();
        rows.parent.tz = Some("Mars/OlympusMons".to_string());
        let err = decode_event(&rows).unwrap_err();
        assert!(matches!(err, StoreError::MalformedRow(_)));
    }
}
