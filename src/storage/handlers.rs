use axum::{Json, extract::Extension, http::StatusCode};
use std::sync::Arc;

use super::coordinator::IndexerCoordinator;
use super::memory::MemoryIndex;
use super::protocol::{
    EventQueueStatus, IndexObjectRequest, IndexObjectResponse, ObjectUpdateRequest,
    ObjectUpdateResponse, StatusEventRequest, StatusEventResponse,
};
use crate::error::{SearchError, SearchResult};
use crate::registry::registry::TypeRegistry;

pub async fn handle_index_object(
    Extension(registry): Extension<Arc<TypeRegistry>>,
    Extension(index): Extension<Arc<MemoryIndex>>,
    Json(req): Json<IndexObjectRequest>,
) -> SearchResult<(StatusCode, Json<IndexObjectResponse>)> {
    let snapshot = registry.snapshot().await;
    let schema = snapshot
        .get(&req.object_type)
        .ok_or_else(|| SearchError::NotFound(format!("No type {} found", req.object_type)))?;

    let guid = req.guid.clone();
    let replaced = index.index_object(schema, req)?;
    let status = if replaced {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((status, Json(IndexObjectResponse { guid, replaced })))
}

pub async fn handle_update_objects(
    Extension(index): Extension<Arc<MemoryIndex>>,
    Json(req): Json<ObjectUpdateRequest>,
) -> SearchResult<(StatusCode, Json<ObjectUpdateResponse>)> {
    let updated = index.apply_update(req)?;
    Ok((StatusCode::OK, Json(ObjectUpdateResponse { updated })))
}

pub async fn handle_submit_event(
    Extension(coordinator): Extension<Arc<IndexerCoordinator>>,
    Json(req): Json<StatusEventRequest>,
) -> SearchResult<(StatusCode, Json<StatusEventResponse>)> {
    let event_id = coordinator.submit(req).await?;
    let queue = coordinator.status().await;
    Ok((StatusCode::ACCEPTED, Json(StatusEventResponse { event_id, queue })))
}

pub async fn handle_event_status(
    Extension(coordinator): Extension<Arc<IndexerCoordinator>>,
) -> (StatusCode, Json<EventQueueStatus>) {
    (StatusCode::OK, Json(coordinator.status().await))
}
