//! Calendar containers and the event store facade.
//!
//! A [`Calendar`] is an account-scoped container of persisted events. It
//! orchestrates the row codec against a [`RowProvider`]: every write is one
//! transactional batch (parent plus children), updates replace the full
//! child-row set instead of diffing it, and the dirty/synced lifecycle is
//! owned here and nowhere else.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::event::Event;
use crate::provider::{EventSelection, ParentRef, RowOp, RowProvider};
use crate::rows::{
    AlarmRow, AttendeeRow, CalendarId, EventId, EventRow, RowSet, decode_event, encode_event,
};

/// Synchronization state of a persisted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Local changes not yet pushed to a remote.
    Dirty,
    /// In step with the remote counterpart.
    Synced,
}

/// A persisted event with its storage identity.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    pub id: EventId,
    pub sync: SyncState,
    pub event: Event,
}

/// An account-scoped calendar owning persisted events.
#[derive(Clone)]
pub struct Calendar {
    pub id: CalendarId,
    pub account: String,
    pub name: String,
    provider: Arc<dyn RowProvider>,
}

impl Calendar {
    /// Find the calendar for account and name, creating it on first use.
    pub fn find_or_create(
        provider: Arc<dyn RowProvider>,
        account: &str,
        name: &str,
    ) -> StoreResult<Calendar> {
        if let Some(row) = provider.find_calendar(account, name)? {
            return Ok(Calendar {
                id: row.id,
                account: row.account,
                name: row.name,
                provider,
            });
        }

        let id = provider.create_calendar(account, name)?;
        debug!(account, name, calendar = %id, "created calendar");
        Ok(Calendar {
            id,
            account: account.to_string(),
            name: name.to_string(),
            provider,
        })
    }

    /// Delete this calendar. Fails with `NotEmpty` while it still owns
    /// events; callers must remove them first. The handle stays usable
    /// on the error path.
    pub fn delete(&self) -> StoreResult<()> {
        let remaining = self.provider.count_events(self.id)?;
        if remaining > 0 {
            return Err(StoreError::NotEmpty(format!(
                "calendar '{}' still owns {} event(s)",
                self.name, remaining
            )));
        }
        self.provider.delete_calendar(self.id)?;
        debug!(calendar = %self.id, name = %self.name, "deleted calendar");
        Ok(())
    }

    // =========================================================================
    // Event CRUD
    // =========================================================================

    /// Persist a new event, returning its storage id. The stored event is
    /// born dirty; a missing UID is generated.
    pub fn add_event(&self, event: &Event) -> StoreResult<EventId> {
        let mut event = event.clone();
        if event.uid.is_none() {
            event.uid = Some(Uuid::new_v4().to_string());
        }

        let rows = encode_event(self.id, &event)?;
        let mut ops = vec![RowOp::InsertEvent(rows.parent)];
        push_children(&mut ops, ParentRef::Inserted, rows.alarms, rows.attendees);

        let id = self
            .provider
            .apply(&ops)?
            .ok_or(StoreError::Fault("insert batch returned no event id"))?;
        debug!(calendar = %self.id, event = %id, "added event");
        Ok(id)
    }

    /// Fetch one event by id. `NotFound` if it is not in this calendar.
    pub fn event(&self, id: EventId) -> StoreResult<StoredEvent> {
        let parent = self.provider.event_row(self.id, id)?.ok_or_else(|| {
            StoreError::NotFound(format!("event {} in calendar '{}'", id, self.name))
        })?;
        self.hydrate(id, parent)
    }

    /// Events matching the selection, fully hydrated, in storage order.
    pub fn events(&self, selection: &EventSelection) -> StoreResult<Vec<StoredEvent>> {
        let mut out = Vec::new();
        for (id, parent) in self.provider.query_events(self.id, selection)? {
            out.push(self.hydrate(id, parent)?);
        }
        Ok(out)
    }

    /// Events with local changes pending upload.
    pub fn dirty_events(&self) -> StoreResult<Vec<StoredEvent>> {
        self.events(&EventSelection {
            dirty: Some(true),
            ..Default::default()
        })
    }

    /// Replace a persisted event wholesale. The parent row is updated and
    /// every child row cleared and re-inserted in the same batch; the id
    /// stays stable and the event becomes dirty again.
    pub fn update_event(&self, id: EventId, event: &Event) -> StoreResult<()> {
        let rows = encode_event(self.id, event)?;
        let mut ops = vec![
            RowOp::UpdateEvent {
                id,
                row: rows.parent,
            },
            RowOp::ClearChildren {
                event: ParentRef::Existing(id),
            },
        ];
        push_children(&mut ops, ParentRef::Existing(id), rows.alarms, rows.attendees);

        self.provider.apply(&ops)?;
        debug!(calendar = %self.id, event = %id, "updated event");
        Ok(())
    }

    /// Delete a persisted event and all its child rows. `NotFound` if it
    /// is not in this calendar.
    pub fn delete_event(&self, id: EventId) -> StoreResult<()> {
        self.provider.apply(&[RowOp::DeleteEvent {
            calendar: self.id,
            id,
        }])?;
        debug!(calendar = %self.id, event = %id, "deleted event");
        Ok(())
    }

    /// Record that an event's local state reached the remote. Touches only
    /// the dirty marker. `NotFound` if the event is not in this calendar.
    pub fn mark_synced(&self, id: EventId) -> StoreResult<()> {
        self.provider.apply(&[RowOp::ClearDirty {
            calendar: self.id,
            id,
        }])?;
        debug!(calendar = %self.id, event = %id, "marked event synced");
        Ok(())
    }

    fn hydrate(&self, id: EventId, parent: EventRow) -> StoreResult<StoredEvent> {
        let sync = if parent.dirty {
            SyncState::Dirty
        } else {
            SyncState::Synced
        };
        let rows = RowSet {
            parent,
            alarms: self.provider.alarm_rows(id)?,
            attendees: self.provider.attendee_rows(id)?,
        };
        Ok(StoredEvent {
            id,
            sync,
            event: decode_event(&rows)?,
        })
    }
}

fn push_children(
    ops: &mut Vec<RowOp>,
    parent: ParentRef,
    alarms: Vec<AlarmRow>,
    attendees: Vec<AttendeeRow>,
) {
    for row in alarms {
        ops.push(RowOp::InsertAlarm { event: parent, row });
    }
    for row in attendees {
        ops.push(RowOp::InsertAttendee { event: parent, row });
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.account, self.name)
    }
}
