//! Relation Engine Search Service Library
//!
//! Server side of the `KBaseRelationEngine` interface: typed keyword search,
//! full-text search and direct retrieval over objects held by an index engine.
//! The binary (`main.rs`) wires these modules into an HTTP node.
//!
//! ## Architecture Modules
//! - **`registry`**: Searchable object types and their keyword schemas, held as a
//!   versioned snapshot behind a read-mostly lock.
//! - **`query`**: Request vocabulary (filters, sorting, pagination, GUIDs) and the
//!   compiler turning filters into `QueryPlan`s.
//! - **`storage`**: The `ObjectIndex` contract and the in-memory reference index,
//!   including sharing, publication and deletion of indexed objects, and the
//!   coordinator applying status events in per-object order.
//! - **`search`**: Execution, ordering, pagination and result shaping behind the
//!   five service methods.
//! - **`rpc`**: JSON-RPC 1.1 over HTTP, caller resolution and the admin routes.
//! - **`config`**: Command line and environment configuration of a node.

pub mod config;
pub mod error;
pub mod query;
pub mod registry;
pub mod rpc;
pub mod search;
pub mod storage;
pub mod wire;

#[cfg(test)]
mod testing;
