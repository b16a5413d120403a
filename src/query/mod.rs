//! Query Module
//!
//! Request-side vocabulary of the search service and the compiler that turns
//! it into executable plans.
//!
//! ## Submodules
//! - **`guid`**: Parsing and lineage of global object identifiers.
//! - **`tokenizer`**: Deterministic text normalization shared by indexing and querying.
//! - **`types`**: MatchFilter, AccessFilter, SortingRule, Pagination, PostProcessing.
//! - **`compiler`**: Validation against the type schema and `QueryPlan` construction.

pub mod compiler;
pub mod guid;
pub mod tokenizer;
pub mod types;

#[cfg(test)]
mod tests;
