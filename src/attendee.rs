//! Attendee and organizer types.

use serde::{Deserialize, Serialize};

/// An event attendee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    /// Display name
    pub name: Option<String>,
    /// Email address
    pub email: String,
    /// Participation role (ROLE)
    pub role: Option<AttendeeRole>,
    /// Response status (PARTSTAT)
    pub status: Option<ParticipationStatus>,
}

/// Event organizer. Distinct from the attendee list even when the same
/// address appears in both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organizer {
    /// Display name
    pub name: Option<String>,
    /// Email address
    pub email: String,
}

/// Attendee role (ROLE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendeeRole {
    Chair,
    Required,
    Optional,
    NonParticipant,
}

impl AttendeeRole {
    /// Also used as the storage code; unknown codes map to None so rows
    /// written by newer schema revisions stay readable.
    pub fn from_ics_str(value: &str) -> Option<AttendeeRole> {
        match value {
            "CHAIR" => Some(AttendeeRole::Chair),
            "REQ-PARTICIPANT" => Some(AttendeeRole::Required),
            "OPT-PARTICIPANT" => Some(AttendeeRole::Optional),
            "NON-PARTICIPANT" => Some(AttendeeRole::NonParticipant),
            _ => None,
        }
    }

    pub fn as_ics_str(&self) -> &'static str {
        match self {
            AttendeeRole::Chair => "CHAIR",
            AttendeeRole::Required => "REQ-PARTICIPANT",
            AttendeeRole::Optional => "OPT-PARTICIPANT",
            AttendeeRole::NonParticipant => "NON-PARTICIPANT",
        }
    }
}

/// Participation status (PARTSTAT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipationStatus {
    NeedsAction,
    Accepted,
    Declined,
    Tentative,
}

impl ParticipationStatus {
    pub fn from_ics_str(value: &str) -> Option<ParticipationStatus> {
        match value {
            "NEEDS-ACTION" => Some(ParticipationStatus::NeedsAction),
            "ACCEPTED" => Some(ParticipationStatus::Accepted),
            "DECLINED" => Some(ParticipationStatus::Declined),
            "TENTATIVE" => Some(ParticipationStatus::Tentative),
            _ => None,
        }
    }

    pub fn as_ics_str(&self) -> &'static str {
        match self {
            ParticipationStatus::NeedsAction => "NEEDS-ACTION",
            ParticipationStatus::Accepted => "ACCEPTED",
            ParticipationStatus::Declined => "DECLINED",
            ParticipationStatus::Tentative => "TENTATIVE",
        }
    }
}
