//! RPC Module
//!
//! HTTP surface of the service.
//!
//! ## Core Concepts
//! - **Envelope**: JSON-RPC 1.1 over `POST /rpc`; method names may carry the
//!   `KBaseRelationEngine.` prefix. Errors keep their kind, code and HTTP status.
//! - **Caller context**: the `Authorization` header is resolved into a `Caller`
//!   by an `AccessResolver` before any search runs.
//! - **Routing**: `router` assembles the RPC, status and admin routes.

pub mod auth;
pub mod handlers;
pub mod protocol;
pub mod router;
