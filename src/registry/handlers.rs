use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use std::sync::Arc;

use super::protocol::TypeChangeResponse;
use super::registry::TypeRegistry;
use super::types::TypeDescriptor;
use crate::error::SearchResult;

pub async fn handle_register_type(
    Extension(registry): Extension<Arc<TypeRegistry>>,
    Json(descriptor): Json<TypeDescriptor>,
) -> SearchResult<(StatusCode, Json<TypeChangeResponse>)> {
    let type_name = descriptor.type_name.clone();
    let schema_version = registry.register(descriptor).await?;

    Ok((
        StatusCode::OK,
        Json(TypeChangeResponse {
            type_name,
            schema_version,
        }),
    ))
}

pub async fn handle_remove_type(
    Extension(registry): Extension<Arc<TypeRegistry>>,
    Path(type_name): Path<String>,
) -> SearchResult<(StatusCode, Json<TypeChangeResponse>)> {
    let schema_version = registry.remove(&type_name).await?;

    Ok((
        StatusCode::OK,
        Json(TypeChangeResponse {
            type_name,
            schema_version,
        }),
    ))
}
