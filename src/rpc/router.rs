use axum::{
    Router,
    extract::Extension,
    routing::{delete, get, post},
};
use std::sync::Arc;

use super::auth::AccessResolver;
use super::handlers::{handle_rpc, handle_status};
use super::protocol::{ENDPOINT_RPC, ENDPOINT_STATUS};
use crate::registry::handlers::{handle_register_type, handle_remove_type};
use crate::registry::protocol::{ENDPOINT_TYPE, ENDPOINT_TYPES};
use crate::search::service::SearchService;
use crate::storage::coordinator::IndexerCoordinator;
use crate::storage::handlers::{
    handle_event_status, handle_index_object, handle_submit_event, handle_update_objects,
};
use crate::storage::memory::MemoryIndex;
use crate::storage::protocol::{ENDPOINT_EVENTS, ENDPOINT_INDEX_OBJECT, ENDPOINT_UPDATE_OBJECTS};

/// Every route of a node: the RPC endpoint, status, and the admin routes
/// feeding the registry, the in-memory index and the event coordinator.
pub fn router(
    service: Arc<SearchService>,
    resolver: Arc<dyn AccessResolver>,
    index: Arc<MemoryIndex>,
    coordinator: Arc<IndexerCoordinator>,
) -> Router {
    let registry = service.registry().clone();

    Router::new()
        .route(ENDPOINT_RPC, post(handle_rpc))
        .route(ENDPOINT_STATUS, get(handle_status))
        .route(ENDPOINT_TYPES, post(handle_register_type))
        .route(ENDPOINT_TYPE, delete(handle_remove_type))
        .route(ENDPOINT_INDEX_OBJECT, post(handle_index_object))
        .route(ENDPOINT_UPDATE_OBJECTS, post(handle_update_objects))
        .route(
            ENDPOINT_EVENTS,
            post(handle_submit_event).get(handle_event_status),
        )
        .layer(Extension(service))
        .layer(Extension(resolver))
        .layer(Extension(registry))
        .layer(Extension(index))
        .layer(Extension(coordinator))
}
