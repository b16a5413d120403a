//! Indexer Coordinator
//!
//! Buffers submitted status events in a backlog, feeds them into the ordered
//! `EventQueue` up to a size limit, and applies whatever the queue releases to
//! the in-memory index. A background task runs one cycle per interval.

use super::events::{EventId, EventQueue, StatusEvent, StatusEventKind};
use super::memory::MemoryIndex;
use super::protocol::{EventQueueStatus, StatusEventRequest};
use crate::error::{SearchError, SearchResult};
use crate::query::guid::Guid;
use crate::registry::registry::{RegistrySnapshot, TypeRegistry};

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;

/// Outcome of one coordinator cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Events moved from the backlog into the queue.
    pub loaded: usize,
    pub applied: usize,
    pub failed: usize,
    /// Events put back because the index was out of service.
    pub deferred: usize,
}

struct CoordinatorState {
    backlog: VecDeque<StatusEvent>,
    queue: EventQueue,
}

pub struct IndexerCoordinator {
    registry: Arc<TypeRegistry>,
    index: Arc<MemoryIndex>,
    state: Mutex<CoordinatorState>,
    next_id: AtomicU64,
    max_queue_size: usize,
}

impl IndexerCoordinator {
    pub fn new(
        registry: Arc<TypeRegistry>,
        index: Arc<MemoryIndex>,
        max_queue_size: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            index,
            state: Mutex::new(CoordinatorState {
                backlog: VecDeque::new(),
                queue: EventQueue::new(),
            }),
            next_id: AtomicU64::new(1),
            max_queue_size: max_queue_size.max(1),
        })
    }

    /// Validates `request` and appends it to the backlog.
    ///
    /// A `new_version` event must name the same GUID as the object it carries.
    pub async fn submit(&self, request: StatusEventRequest) -> SearchResult<EventId> {
        let guid = Guid::parse(&request.guid)?;
        if let StatusEventKind::NewVersion { object } = &request.kind {
            let object_guid = Guid::parse(&object.guid)?;
            if object_guid != guid {
                return Err(SearchError::invalid(format!(
                    "Event GUID {} does not match object GUID {}",
                    guid, object_guid
                )));
            }
        }

        let id = EventId(self.next_id.fetch_add(1, Ordering::SeqCst));
        tracing::debug!("Accepted status event {} for {}", id, guid);
        self.state.lock().await.backlog.push_back(StatusEvent {
            id,
            guid,
            timestamp: request.timestamp,
            kind: request.kind,
        });
        Ok(id)
    }

    pub async fn status(&self) -> EventQueueStatus {
        let state = self.state.lock().await;
        EventQueueStatus {
            backlog: state.backlog.len(),
            queued: state.queue.size(),
            ready: state.queue.ready_len(),
        }
    }

    /// Loads the backlog into the queue, then applies events until the queue
    /// releases no more.
    ///
    /// An event the index rejects is dropped and counted as failed. If the
    /// index is out of service the current batch goes back to the ready set
    /// and the cycle ends.
    pub async fn run_cycle(&self) -> CycleSummary {
        let snapshot = self.registry.snapshot().await;
        let mut state = self.state.lock().await;
        let CoordinatorState { backlog, queue } = &mut *state;
        let mut summary = CycleSummary::default();

        while queue.size() < self.max_queue_size {
            let Some(event) = backlog.pop_front() else {
                break;
            };
            queue.load(event);
            summary.loaded += 1;
        }

        loop {
            queue.move_to_ready();
            let batch = queue.move_ready_to_processing();
            if batch.is_empty() {
                break;
            }

            let mut batch = batch.into_iter();
            while let Some(event) = batch.next() {
                match self.apply(&snapshot, &event) {
                    Ok(updated) => {
                        summary.applied += 1;
                        tracing::debug!("Applied event {} to {} objects", event.id, updated);
                    }
                    Err(e) if e.is_retryable() => {
                        tracing::warn!("Deferring status events: {}", e);
                        for event in std::iter::once(event).chain(batch) {
                            queue.return_to_ready(&event);
                            summary.deferred += 1;
                        }
                        return summary;
                    }
                    Err(e) => {
                        summary.failed += 1;
                        tracing::error!(
                            "Status event {} for {} failed: {}",
                            event.id,
                            event.guid,
                            e
                        );
                    }
                }
                queue.set_processing_complete(&event);
            }
        }

        if summary.applied > 0 || summary.failed > 0 {
            tracing::info!(
                "Indexer cycle applied {} events, {} failed, {} still queued",
                summary.applied,
                summary.failed,
                queue.size() + backlog.len()
            );
        }
        summary
    }

    fn apply(&self, snapshot: &RegistrySnapshot, event: &StatusEvent) -> SearchResult<usize> {
        self.index.ensure_available()?;

        let guid = &event.guid;
        let updated = match &event.kind {
            StatusEventKind::NewVersion { object } => {
                let schema = snapshot.get(&object.object_type).ok_or_else(|| {
                    SearchError::NotFound(format!("No type {} found", object.object_type))
                })?;
                self.index.index_object(schema, object.clone())?;
                1
            }
            StatusEventKind::DeleteAllVersions => self.index.delete_all_versions(guid),
            StatusEventKind::UndeleteAllVersions => self.index.undelete_all_versions(guid),
            StatusEventKind::PublishAllVersions => self.index.publish_all_versions(guid),
            StatusEventKind::UnpublishAllVersions => self.index.unpublish_all_versions(guid),
            StatusEventKind::RenameAllVersions { object_name } => {
                self.index.set_name_on_all_versions(guid, object_name)
            }
        };
        Ok(updated)
    }

    /// Spawns the loop running one cycle per `interval`. While the backlog
    /// still holds events the next cycle starts immediately.
    pub fn start(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tracing::info!(
            "Starting indexer coordinator (cycle every {:?}, queue limit {})",
            interval,
            self.max_queue_size
        );

        tokio::spawn(async move {
            loop {
                let summary = self.run_cycle().await;
                let backlog = self.state.lock().await.backlog.len();
                if summary.loaded > 0 && summary.deferred == 0 && backlog > 0 {
                    continue;
                }
                tokio::time::sleep(interval).await;
            }
        })
    }
}
