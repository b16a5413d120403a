//! Ordered Status Events
//!
//! Changes to indexed objects arrive as status events. Events for one object
//! are applied in timestamp order, with one extra rule: an object-level event
//! (delete, rename, publish of every version) runs alone. It waits for the
//! version-level events before it to finish, and the events after it wait for
//! it in turn. Version-level events with no object-level event between them
//! may run together.
//!
//! ## Lifecycle
//! `load` → queued → `move_to_ready` → ready → `move_ready_to_processing` →
//! processing → `set_processing_complete`.

use super::protocol::IndexObjectRequest;
use crate::query::guid::Guid;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened to the object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum StatusEventKind {
    /// A new version to index.
    NewVersion { object: IndexObjectRequest },
    DeleteAllVersions,
    UndeleteAllVersions,
    PublishAllVersions,
    UnpublishAllVersions,
    RenameAllVersions { object_name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    pub id: EventId,
    /// The object the event applies to; any version of its lineage.
    pub guid: Guid,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    pub kind: StatusEventKind,
}

impl StatusEvent {
    /// Whether the event touches a single version rather than the whole object.
    pub fn is_version_level(&self) -> bool {
        matches!(self.kind, StatusEventKind::NewVersion { .. })
    }

    fn order_key(&self) -> (i64, EventId) {
        (self.timestamp, self.id)
    }
}

/// Events of a single object.
#[derive(Debug, Default)]
pub struct ObjectEventQueue {
    queued: BTreeMap<(i64, EventId), StatusEvent>,
    ready: BTreeMap<(i64, EventId), StatusEvent>,
    processing: BTreeMap<(i64, EventId), StatusEvent>,
}

impl ObjectEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, event: StatusEvent) {
        self.queued.insert(event.order_key(), event);
    }

    /// Moves the events that may run now into the ready set and returns them.
    pub fn move_to_ready(&mut self) -> Vec<StatusEvent> {
        let mut moved = Vec::new();
        if self.blocked() {
            return moved;
        }

        while let Some(entry) = self.queued.first_entry() {
            let object_level = !entry.get().is_version_level();
            if object_level && !(self.ready.is_empty() && self.processing.is_empty()) {
                break;
            }
            let event = entry.remove();
            moved.push(event.clone());
            self.ready.insert(event.order_key(), event);
            if object_level {
                break;
            }
        }
        moved
    }

    /// Marks every ready event as processing and returns them in timestamp order.
    pub fn move_ready_to_processing(&mut self) -> Vec<StatusEvent> {
        let moved: Vec<StatusEvent> = self.ready.values().cloned().collect();
        self.processing.append(&mut self.ready);
        moved
    }

    /// Drops a processed event and readies whatever it was blocking.
    /// Returns false if the event was not processing.
    pub fn set_processing_complete(&mut self, event: &StatusEvent) -> bool {
        let found = self.processing.remove(&event.order_key()).is_some();
        self.move_to_ready();
        found
    }

    /// Puts a processing event back into the ready set so it runs again.
    pub fn return_to_ready(&mut self, event: &StatusEvent) -> bool {
        match self.processing.remove(&event.order_key()) {
            Some(event) => {
                self.ready.insert(event.order_key(), event);
                true
            }
            None => false,
        }
    }

    pub fn ready(&self) -> impl Iterator<Item = &StatusEvent> {
        self.ready.values()
    }

    pub fn processing(&self) -> impl Iterator<Item = &StatusEvent> {
        self.processing.values()
    }

    pub fn size(&self) -> usize {
        self.queued.len() + self.ready.len() + self.processing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// True while an object-level event is ready or processing.
    fn blocked(&self) -> bool {
        self.ready()
            .chain(self.processing())
            .any(|e| !e.is_version_level())
    }
}

/// Per-object queues for every object with outstanding events.
#[derive(Debug, Default)]
pub struct EventQueue {
    objects: HashMap<String, ObjectEventQueue>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, event: StatusEvent) {
        self.objects
            .entry(event.guid.lineage())
            .or_insert_with(ObjectEventQueue::new)
            .load(event);
    }

    pub fn move_to_ready(&mut self) -> Vec<StatusEvent> {
        self.objects
            .values_mut()
            .flat_map(|q| q.move_to_ready())
            .collect()
    }

    /// Ready events of every object, in timestamp order.
    pub fn move_ready_to_processing(&mut self) -> Vec<StatusEvent> {
        let mut moved: Vec<StatusEvent> = self
            .objects
            .values_mut()
            .flat_map(|q| q.move_ready_to_processing())
            .collect();
        moved.sort_by_key(StatusEvent::order_key);
        moved
    }

    pub fn set_processing_complete(&mut self, event: &StatusEvent) -> bool {
        let lineage = event.guid.lineage();
        let Some(queue) = self.objects.get_mut(&lineage) else {
            return false;
        };
        let found = queue.set_processing_complete(event);
        if queue.is_empty() {
            self.objects.remove(&lineage);
        }
        found
    }

    pub fn return_to_ready(&mut self, event: &StatusEvent) -> bool {
        self.objects
            .get_mut(&event.guid.lineage())
            .is_some_and(|q| q.return_to_ready(event))
    }

    /// Events ready to run, including those put back by `return_to_ready`.
    pub fn ready_len(&self) -> usize {
        self.objects.values().map(|q| q.ready().count()).sum()
    }

    pub fn size(&self) -> usize {
        self.objects.values().map(ObjectEventQueue::size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
