//! Index Collaborator Contract
//!
//! Defines what the search layer needs from an index engine, and the Data
//! Transfer Objects used by the administrative HTTP routes that feed the
//! reference in-memory index.

use super::events::{EventId, StatusEventKind};
use super::types::IndexedObject;
use crate::error::SearchResult;
use crate::query::compiler::{QueryPlan, Visibility};
use crate::query::guid::Guid;
use crate::query::types::KeyValue;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// --- API Endpoints ---

/// Indexes (or replaces) a single object.
pub const ENDPOINT_INDEX_OBJECT: &str = "/admin/objects";
/// Applies a sharing/publishing/deletion change to existing objects.
pub const ENDPOINT_UPDATE_OBJECTS: &str = "/admin/objects/update";
/// Submits a status event (POST) or reports the event queue (GET).
pub const ENDPOINT_EVENTS: &str = "/admin/events";

/// The index engine behind the search service.
///
/// Both operations are read-only. Implementations report an unavailable
/// backend as `SearchError::TransientIndex`.
#[async_trait]
pub trait ObjectIndex: Send + Sync {
    /// Every object matching the plan, in no particular order.
    ///
    /// When `plan.latest_only()` is set, only the latest live version of each
    /// lineage is a candidate.
    async fn search(&self, plan: &QueryPlan) -> SearchResult<Vec<IndexedObject>>;

    /// One slot per requested GUID, `None` when the object is unknown,
    /// deleted, or not admitted by `visibility`.
    async fn lookup(
        &self,
        guids: &[Guid],
        visibility: &Visibility,
    ) -> SearchResult<Vec<Option<IndexedObject>>>;

    /// Number of live objects.
    async fn object_count(&self) -> SearchResult<usize>;
}

// --- Data Transfer Objects ---

/// Payload for indexing one object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexObjectRequest {
    pub guid: String,
    pub object_type: String,
    #[serde(default)]
    pub parent_guid: Option<String>,
    #[serde(default)]
    pub object_name: String,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub parent_data: Option<Value>,
    #[serde(default)]
    pub key_props: BTreeMap<String, KeyValue>,
    /// Defaults to the access group encoded in the GUID.
    #[serde(default)]
    pub access_group_id: Option<i64>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexObjectResponse {
    pub guid: String,
    pub replaced: bool,
}

/// Changes applied to already indexed objects.
///
/// Set operations take exact GUIDs; the `*_all_versions` operations act on
/// every version of the object's lineage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum ObjectUpdateRequest {
    Share {
        guids: Vec<String>,
        access_group_id: i64,
        #[serde(default)]
        public_group: bool,
    },
    Unshare {
        guids: Vec<String>,
        access_group_id: i64,
    },
    Publish {
        guids: Vec<String>,
    },
    Unpublish {
        guids: Vec<String>,
    },
    PublishExternally {
        guids: Vec<String>,
        access_group_id: i64,
    },
    UnpublishExternally {
        guids: Vec<String>,
        access_group_id: i64,
    },
    DeleteAllVersions {
        guid: String,
    },
    UndeleteAllVersions {
        guid: String,
    },
    PublishAllVersions {
        guid: String,
    },
    UnpublishAllVersions {
        guid: String,
    },
    RenameAllVersions {
        guid: String,
        object_name: String,
    },
}

/// Acknowledgment for update operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct ObjectUpdateResponse {
    /// Number of stored objects that were modified.
    pub updated: usize,
}

/// A status event as submitted to the indexer coordinator.
///
/// ```json
/// {"guid": "WS:1/1", "timestamp": 1500, "event_type": "rename_all_versions", "object_name": "E. coli"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEventRequest {
    pub guid: String,
    /// Milliseconds since the epoch; events of one object apply in this order.
    pub timestamp: i64,
    #[serde(flatten)]
    pub kind: StatusEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQueueStatus {
    /// Accepted events not yet loaded into the queue.
    pub backlog: usize,
    pub queued: usize,
    /// Events waiting to be retried.
    pub ready: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusEventResponse {
    pub event_id: EventId,
    pub queue: EventQueueStatus,
}
