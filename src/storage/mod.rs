//! Object Index Module
//!
//! The index engine the search service runs plans against.
//!
//! ## Core Concepts
//! - **Contract**: `ObjectIndex` is all the search layer knows about an index: search by plan,
//!   look up by GUID, count live objects.
//! - **Reference engine**: `MemoryIndex` keeps objects in a concurrent map and evaluates plans
//!   by scanning the objects of the requested type.
//! - **Administration**: objects are indexed and their sharing, publication and deletion state
//!   changed through the admin HTTP routes in `handlers`.
//! - **Status events**: `coordinator` applies submitted events in per-object timestamp order,
//!   using the blocking rules of `events`.

pub mod coordinator;
pub mod events;
pub mod handlers;
pub mod memory;
pub mod protocol;
pub mod types;
