//! Building events from iCalendar text using the icalendar crate's parser.
//!
//! Construction only: the parsed property model is the source
//! representation for [`Event`], and nothing here writes ICS back out.

use chrono::NaiveDateTime;
use icalendar::{
    DatePerhapsTime,
    parser::{Property, read_calendar, unfold},
};

use crate::alarm::AlarmTrigger;
use crate::attendee::{Attendee, AttendeeRole, Organizer, ParticipationStatus};
use crate::event::{Event, EventTime};

/// Build an Event from the first VEVENT in an iCalendar document.
/// Returns None when no parseable VEVENT exists.
pub fn parse_event(content: &str) -> Option<Event> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;
    let vevent = calendar.components.iter().find(|c| c.name == "VEVENT")?;

    let uid = vevent.find_prop("UID").map(|p| p.val.to_string());
    let summary = vevent.find_prop("SUMMARY").map(|p| p.val.to_string());
    let description = vevent.find_prop("DESCRIPTION").map(|p| p.val.to_string());
    let location = vevent.find_prop("LOCATION").map(|p| p.val.to_string());

    let start = to_event_time(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?);
    // DTEND is optional; a missing one means a zero-length event
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_event_time)
        .unwrap_or_else(|| start.clone());

    // Recurrence properties pass through verbatim; the store never
    // interprets them
    let rrule = vevent.find_prop("RRULE").map(|p| p.val.to_string());
    let rdate = vevent.find_prop("RDATE").map(|p| p.val.to_string());
    let exrule = vevent.find_prop("EXRULE").map(|p| p.val.to_string());
    let exdate = vevent.find_prop("EXDATE").map(|p| p.val.to_string());

    let organizer = vevent.find_prop("ORGANIZER").map(parse_attendee).map(|a| Organizer {
        name: a.name,
        email: a.email,
    });
    let attendees: Vec<Attendee> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "ATTENDEE")
        .map(parse_attendee)
        .collect();

    let alarms: Vec<AlarmTrigger> = vevent
        .components
        .iter()
        .filter(|c| c.name == "VALARM")
        .filter_map(|alarm| parse_trigger(alarm.find_prop("TRIGGER")?))
        .collect();

    Some(Event {
        uid,
        summary,
        description,
        location,
        start,
        end,
        rrule,
        rdate,
        exrule,
        exdate,
        organizer,
        attendees,
        alarms,
    })
}

/// Convert icalendar's DatePerhapsTime to our EventTime, preserving
/// timezone info
fn to_event_time(dpt: DatePerhapsTime) -> EventTime {
    match dpt {
        DatePerhapsTime::Date(d) => EventTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
            icalendar::CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => {
                EventTime::DateTimeZoned {
                    datetime: date_time,
                    tzid,
                }
            }
        },
    }
}

/// Parse an ATTENDEE/ORGANIZER property with its CN, ROLE and PARTSTAT
/// parameters
fn parse_attendee(prop: &Property) -> Attendee {
    let email = prop
        .val
        .as_ref()
        .strip_prefix("mailto:")
        .unwrap_or(prop.val.as_ref())
        .to_string();

    let name = prop
        .params
        .iter()
        .find(|p| p.key == "CN")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let role = prop
        .params
        .iter()
        .find(|p| p.key == "ROLE")
        .and_then(|p| p.val.as_ref())
        .and_then(|v| AttendeeRole::from_ics_str(v.as_ref()));

    let status = prop
        .params
        .iter()
        .find(|p| p.key == "PARTSTAT")
        .and_then(|p| p.val.as_ref())
        .and_then(|v| ParticipationStatus::from_ics_str(v.as_ref()));

    Attendee {
        name,
        email,
        role,
        status,
    }
}

/// Parse a TRIGGER value: a signed duration (-P1DT2H3M4S) or an absolute
/// instant when VALUE=DATE-TIME is set
fn parse_trigger(prop: &Property) -> Option<AlarmTrigger> {
    let value = prop.val.as_ref();

    let is_absolute = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE-TIME"));

    if is_absolute {
        let s = value.trim_end_matches('Z');
        let naive = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").ok()?;
        return Some(AlarmTrigger::Absolute(naive.and_utc()));
    }

    let is_before = value.starts_with('-');
    let duration_str = value.trim_start_matches('-').trim_start_matches('+');

    let duration = iso8601::duration(duration_str).ok()?;
    let std_duration: std::time::Duration = duration.into();
    let offset = chrono::Duration::from_std(std_duration).ok()?;

    Some(AlarmTrigger::Relative(if is_before { -offset } else { offset }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    #[test]
    fn test_parse_full_vevent() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:event-1@example.com
SUMMARY:Planning
DESCRIPTION:Quarterly planning
LOCATION:Room 2
DTSTART;TZID=Europe/Vienna:20250704T090000
DTEND;TZID=Europe/Vienna:20250704T110000
ORGANIZER;CN=Boss:mailto:boss@example.com
ATTENDEE;CN=Alice;ROLE=REQ-PARTICIPANT;PARTSTAT=ACCEPTED:mailto:alice@example.com
ATTENDEE;PARTSTAT=DECLINED:mailto:bob@example.com
BEGIN:VALARM
ACTION:DISPLAY
TRIGGER:-P1DT2H3M4S
END:VALARM
END:VEVENT
END:VCALENDAR"#;

        let event = parse_event(ics).expect("Should parse");

        assert_eq!(event.uid.as_deref(), Some("event-1@example.com"));
        assert_eq!(event.summary.as_deref(), Some("Planning"));
        assert_eq!(event.location.as_deref(), Some("Room 2"));
        assert_eq!(
            event.start,
            EventTime::DateTimeZoned {
                datetime: NaiveDate::from_ymd_opt(2025, 7, 4)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap(),
                tzid: "Europe/Vienna".to_string(),
            }
        );

        let organizer = event.organizer.expect("Should have organizer");
        assert_eq!(organizer.email, "boss@example.com");
        assert_eq!(organizer.name.as_deref(), Some("Boss"));

        assert_eq!(event.attendees.len(), 2);
        assert_eq!(event.attendees[0].role, Some(AttendeeRole::Required));
        assert_eq!(
            event.attendees[0].status,
            Some(ParticipationStatus::Accepted)
        );
        assert_eq!(event.attendees[1].role, None);

        assert_eq!(
            event.alarms,
            vec![AlarmTrigger::Relative(
                -(Duration::days(1)
                    + Duration::hours(2)
                    + Duration::minutes(3)
                    + Duration::seconds(4))
            )]
        );
    }

    #[test]
    fn test_parse_all_day_event() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:allday-1
SUMMARY:Holiday
DTSTART;VALUE=DATE:20150501
DTEND;VALUE=DATE:20150502
END:VEVENT
END:VCALENDAR"#;

        let event = parse_event(ics).expect("Should parse");
        assert_eq!(
            event.start,
            EventTime::Date(NaiveDate::from_ymd_opt(2015, 5, 1).unwrap())
        );
        assert!(event.start.is_date_only());
    }

    #[test]
    fn test_parse_absolute_trigger() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:abs-1
SUMMARY:Launch
DTSTART:20250501T120000Z
DTEND:20250501T130000Z
BEGIN:VALARM
ACTION:DISPLAY
TRIGGER;VALUE=DATE-TIME:20250501T113000Z
END:VALARM
END:VEVENT
END:VCALENDAR"#;

        let event = parse_event(ics).expect("Should parse");
        assert_eq!(
            event.alarms,
            vec![AlarmTrigger::Absolute(
                Utc.with_ymd_and_hms(2025, 5, 1, 11, 30, 0).unwrap()
            )]
        );
    }

    #[test]
    fn test_recurrence_blobs_pass_through_verbatim() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:rec-1
SUMMARY:Standup
DTSTART:20240101T100000Z
DTEND:20240101T101500Z
RRULE:FREQ=WEEKLY;BYDAY=MO
EXDATE:20240108T100000Z
END:VEVENT
END:VCALENDAR"#;

        let event = parse_event(ics).expect("Should parse");
        assert_eq!(event.rrule.as_deref(), Some("FREQ=WEEKLY;BYDAY=MO"));
        assert_eq!(event.exdate.as_deref(), Some("20240108T100000Z"));
        assert_eq!(event.rdate, None);
    }

    #[test]
    fn test_no_vevent_is_none() {
        let ics = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:TEST\nEND:VCALENDAR";
        assert!(parse_event(ics).is_none());
    }

    #[test]
    fn test_missing_dtend_falls_back_to_start() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:short-1
SUMMARY:Ping
DTSTART:20250501T120000Z
END:VEVENT
END:VCALENDAR"#;

        let event = parse_event(ics).expect("Should parse");
        assert_eq!(event.start, event.end);
    }
}
