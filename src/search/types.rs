use crate::query::types::{AccessFilter, MatchFilter, Pagination, PostProcessing, SortingRule};
use crate::registry::types::TypeDescriptor;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One found object, shaped by `PostProcessing`. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_props: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListTypesInput {
    #[serde(default)]
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListTypesOutput {
    pub types: BTreeMap<String, TypeDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchTypesInput {
    #[serde(default)]
    pub match_filter: MatchFilter,
    #[serde(default)]
    pub access_filter: Option<AccessFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTypesOutput {
    pub type_to_count: BTreeMap<String, u64>,
    /// Milliseconds.
    pub search_time: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchObjectsInput {
    pub object_type: String,
    #[serde(default)]
    pub match_filter: MatchFilter,
    #[serde(default)]
    pub sorting_rules: Option<Vec<SortingRule>>,
    #[serde(default)]
    pub access_filter: Option<AccessFilter>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub post_processing: Option<PostProcessing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchObjectsOutput {
    /// Effective window, after capping `count`.
    pub pagination: Pagination,
    pub sorting_rules: Vec<SortingRule>,
    pub objects: Vec<ObjectData>,
    pub total: u64,
    pub search_time: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetObjectsInput {
    pub guids: Vec<String>,
    #[serde(default)]
    pub post_processing: Option<PostProcessing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetObjectsOutput {
    pub objects: Vec<ObjectData>,
    pub search_time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusOutput {
    pub state: String,
    pub message: String,
    pub version: String,
    pub schema_version: u64,
    pub type_count: usize,
    pub object_count: usize,
    pub uptime_ms: u64,
}
