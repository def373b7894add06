//! Profile document: validation, conservative enrichment and persistence.

pub mod completeness;
pub mod enrich;
pub mod handlers;
pub mod invariants;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod prompts;
pub mod store;
