use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Registers or replaces a type.
pub const ENDPOINT_TYPES: &str = "/admin/types";
/// Removes a type.
pub const ENDPOINT_TYPE: &str = "/admin/types/:name";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeChangeResponse {
    pub type_name: String,
    /// Registry version after the change.
    pub schema_version: u64,
}
