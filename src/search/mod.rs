//! Search Service Module
//!
//! Answers the read operations of the relation engine interface on top of the
//! type registry and the object index.
//!
//! ## Pipeline
//! caller resolved → plan compiled (`query::compiler`) → plan executed against the
//! index, sorted and windowed (`executor`) → hits shaped into `ObjectData` (`assembler`).
//!
//! ## Submodules
//! - **`executor`**: Sorting, pagination and per-type counting.
//! - **`assembler`**: Post-processing of hits: id-only output, field suppression, data projection.
//! - **`service`**: `SearchService`, the facade behind the RPC methods.
//! - **`types`**: Method inputs and outputs, and `ObjectData`.

pub mod assembler;
pub mod executor;
pub mod service;
pub mod types;
