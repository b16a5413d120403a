use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

use super::auth::AccessResolver;
use super::protocol::{
    CODE_METHOD_NOT_FOUND, CODE_PARSE_ERROR, Method, RpcRequest, RpcResponse,
};
use crate::error::{ErrorBody, ErrorKind, SearchError, SearchResult};
use crate::query::types::Caller;
use crate::search::service::SearchService;
use crate::search::types::StatusOutput;

pub async fn handle_rpc(
    Extension(service): Extension<Arc<SearchService>>,
    Extension(resolver): Extension<Arc<dyn AccessResolver>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<RpcResponse>) {
    let request: RpcRequest = match serde_json::from_str(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("Rejected unparsable RPC request: {}", e);
            let error = ErrorBody::new(
                ErrorKind::InvalidArgumentError.name(),
                CODE_PARSE_ERROR,
                format!("Parse error: {}", e),
            );
            return (StatusCode::BAD_REQUEST, Json(RpcResponse::failure(None, error)));
        }
    };

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("rpc", %request_id, method = %request.method);
    let token = bearer_token(&headers);

    async move {
        let Some(method) = Method::parse(&request.method) else {
            tracing::warn!("Unknown method {}", request.method);
            let error = ErrorBody::new(
                ErrorKind::InvalidArgumentError.name(),
                CODE_METHOD_NOT_FOUND,
                format!("Unknown method: {}", request.method),
            );
            return (
                StatusCode::BAD_REQUEST,
                Json(RpcResponse::failure(request.id, error)),
            );
        };

        match dispatch(&service, resolver.as_ref(), token.as_deref(), method, &request).await {
            Ok(output) => {
                tracing::debug!("Call succeeded");
                (
                    StatusCode::OK,
                    Json(RpcResponse::success(request.id, output)),
                )
            }
            Err(e) => {
                if matches!(e, SearchError::Internal(_)) {
                    tracing::error!("Call failed: {}", e);
                } else {
                    tracing::info!(retryable = e.is_retryable(), "Call failed: {}", e);
                }
                (
                    e.status(),
                    Json(RpcResponse::failure(request.id, ErrorBody::from(&e))),
                )
            }
        }
    }
    .instrument(span)
    .await
}

async fn dispatch(
    service: &SearchService,
    resolver: &dyn AccessResolver,
    token: Option<&str>,
    method: Method,
    request: &RpcRequest,
) -> SearchResult<Value> {
    match method {
        Method::ListTypes => to_value(service.list_types(input(request)?).await?),
        Method::Status => to_value(service.status().await),
        Method::SearchTypes => {
            let input = input(request)?;
            let caller = caller(resolver, token).await?;
            to_value(service.search_types(input, &caller).await?)
        }
        Method::SearchObjects => {
            let input = input(request)?;
            let caller = caller(resolver, token).await?;
            to_value(service.search_objects(input, &caller).await?)
        }
        Method::GetObjects => {
            let input = input(request)?;
            let caller = caller(resolver, token).await?;
            to_value(service.get_objects(input, &caller).await?)
        }
    }
}

/// Decodes the first positional parameter; a missing one reads as `{}`.
fn input<T: DeserializeOwned>(request: &RpcRequest) -> SearchResult<T> {
    match request.first_param() {
        Value::Null => Ok(serde_json::from_value(Value::Object(Default::default()))?),
        param => Ok(serde_json::from_value(param)?),
    }
}

async fn caller(resolver: &dyn AccessResolver, token: Option<&str>) -> SearchResult<Caller> {
    let caller = resolver.resolve(token).await?;
    if let Some(user) = &caller.user {
        tracing::debug!("Resolved caller {} with {} groups", user, caller.access_groups.len());
    }
    Ok(caller)
}

fn to_value<T: Serialize>(output: T) -> SearchResult<Value> {
    serde_json::to_value(output)
        .map_err(|e| SearchError::Internal(format!("Failed to serialize result: {}", e)))
}

/// Token from the `Authorization` header, with or without a `Bearer ` prefix.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then(|| token.to_string())
}

pub async fn handle_status(
    Extension(service): Extension<Arc<SearchService>>,
) -> (StatusCode, Json<StatusOutput>) {
    (StatusCode::OK, Json(service.status().await))
}
