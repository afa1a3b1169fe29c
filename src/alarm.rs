//! Alarm triggers and their minute-granularity storage conversion.
//!
//! The row schema stores one signed integer of whole minutes per alarm plus
//! a flag saying whether the offset is relative to the event start. RFC5545
//! triggers are richer (arbitrary durations, absolute instants), so the
//! conversion is lossy below minute granularity and collapses day/hour
//! components; only the total offset survives a round trip.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// When an alarm fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlarmTrigger {
    /// Signed offset from the event start; negative fires before it.
    Relative(#[serde(with = "duration_seconds")] Duration),
    /// Fixed instant, independent of the event start.
    Absolute(DateTime<Utc>),
}

/// Serialize a signed offset as whole seconds (chrono durations have no
/// serde support of their own).
mod duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        value.num_seconds().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::seconds(i64::deserialize(deserializer)?))
    }
}

impl AlarmTrigger {
    /// Trigger the given span before the event start.
    pub fn before_start(days: i64, hours: i64, minutes: i64, seconds: i64) -> AlarmTrigger {
        AlarmTrigger::Relative(
            -(Duration::days(days)
                + Duration::hours(hours)
                + Duration::minutes(minutes)
                + Duration::seconds(seconds)),
        )
    }

    /// Storage form: signed whole minutes plus the relative-to-start flag.
    ///
    /// Relative offsets keep their sign and drop sub-minute remainder toward
    /// zero. Absolute instants store `event_start - instant`, so an alarm
    /// before the start yields a positive minute count with the flag unset.
    pub fn to_storage_minutes(&self, event_start: DateTime<Utc>) -> (i64, bool) {
        match self {
            AlarmTrigger::Relative(offset) => (offset.num_minutes(), true),
            AlarmTrigger::Absolute(instant) => ((event_start - *instant).num_minutes(), false),
        }
    }

    /// Inverse of [`to_storage_minutes`](Self::to_storage_minutes).
    ///
    /// Always reconstructs a pure-minutes relative trigger; absolute rows
    /// come back as the equivalent offset before the start.
    pub fn from_storage_minutes(minutes: i64, relative: bool) -> AlarmTrigger {
        let offset = if relative { minutes } else { -minutes };
        AlarmTrigger::Relative(Duration::minutes(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_trigger_truncates_seconds_toward_zero() {
        let trigger = AlarmTrigger::before_start(1, 2, 3, 4);
        let (minutes, relative) = trigger.to_storage_minutes(start());
        assert_eq!(minutes, -(1 * 1440 + 2 * 60 + 3), "4 seconds are dropped");
        assert!(relative);
    }

    #[test]
    fn test_zero_offset_is_valid() {
        let trigger = AlarmTrigger::Relative(Duration::zero());
        assert_eq!(trigger.to_storage_minutes(start()), (0, true));
        assert_eq!(
            AlarmTrigger::from_storage_minutes(0, true),
            AlarmTrigger::Relative(Duration::zero())
        );
    }

    #[test]
    fn test_absolute_trigger_measures_from_start() {
        let trigger = AlarmTrigger::Absolute(start() - Duration::minutes(30));
        let (minutes, relative) = trigger.to_storage_minutes(start());
        assert_eq!(minutes, 30, "before start stores positive minutes");
        assert!(!relative);

        let trigger = AlarmTrigger::Absolute(start() + Duration::hours(1));
        assert_eq!(trigger.to_storage_minutes(start()), (-60, false));
    }

    #[test]
    fn test_from_storage_collapses_to_pure_minutes() {
        let trigger = AlarmTrigger::from_storage_minutes(-1563, true);
        assert_eq!(trigger, AlarmTrigger::Relative(Duration::minutes(-1563)));

        // An absolute row decodes as the equivalent before-start offset
        let trigger = AlarmTrigger::from_storage_minutes(30, false);
        assert_eq!(trigger, AlarmTrigger::Relative(Duration::minutes(-30)));
    }

    #[test]
    fn test_minute_offsets_roundtrip() {
        for minutes in [-1563, -30, 0, 15, 1440] {
            let (stored, relative) =
                AlarmTrigger::Relative(Duration::minutes(minutes)).to_storage_minutes(start());
            assert_eq!(stored, minutes);
            assert_eq!(
                AlarmTrigger::from_storage_minutes(stored, relative),
                AlarmTrigger::Relative(Duration::minutes(minutes))
            );
        }
    }
}
