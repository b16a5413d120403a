//! JSON-RPC 1.1 Envelope
//!
//! Request and response records of the `/rpc` endpoint. A call is
//! `{"version":"1.1","method":"KBaseRelationEngine.search_objects","params":[{...}],"id":"7"}`;
//! the answer carries either `result` (a one-element array) or `error`.

use crate::error::ErrorBody;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- API Endpoints ---

pub const ENDPOINT_RPC: &str = "/rpc";
pub const ENDPOINT_STATUS: &str = "/status";

pub const SERVICE_NAME: &str = "KBaseRelationEngine";
pub const RPC_VERSION: &str = "1.1";

pub const CODE_PARSE_ERROR: i64 = -32700;
pub const CODE_METHOD_NOT_FOUND: i64 = -32601;

/// Methods served by the relation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    ListTypes,
    SearchTypes,
    SearchObjects,
    GetObjects,
    Status,
}

impl Method {
    /// Accepts the bare name or the service-qualified one.
    pub fn parse(name: &str) -> Option<Self> {
        let bare = name
            .strip_prefix(SERVICE_NAME)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name);
        match bare {
            "list_types" => Some(Method::ListTypes),
            "search_types" => Some(Method::SearchTypes),
            "search_objects" => Some(Method::SearchObjects),
            "get_objects" => Some(Method::GetObjects),
            "status" => Some(Method::Status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub version: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Option<Value>,
}

impl RpcRequest {
    /// First positional parameter, `Null` when none was sent.
    pub fn first_param(&self) -> Value {
        match &self.params {
            Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
            other => other.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub version: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl RpcResponse {
    pub fn success(id: Option<Value>, output: Value) -> Self {
        Self {
            version: RPC_VERSION.to_string(),
            id,
            result: Some(Value::Array(vec![output])),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, error: ErrorBody) -> Self {
        Self {
            version: RPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}
