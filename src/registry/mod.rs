//! Type Registry Module
//!
//! Describes which object types are searchable and which typed keywords each
//! of them carries.
//!
//! ## Submodules
//! - **`types`**: `TypeDescriptor` / `KeyDescription` and their invariants.
//! - **`registry`**: The versioned, read-mostly registry shared by all requests.
//! - **`loader`**: Reads type definitions from a directory of JSON files.
//! - **`handlers`**: Administrative HTTP routes registering and removing types.

pub mod handlers;
pub mod loader;
pub mod protocol;
pub mod registry;
pub mod types;

#[cfg(test)]
mod tests;
