//! Cache persistence and invalidation for generated documentation.
//!
//! [`store`] is the flat-file key/value layer, [`metadata`] the JSON record
//! of what the cached artifact describes, and [`decision`] the engine that
//! picks an update strategy from the change between revisions.

pub mod decision;
pub mod metadata;
pub mod store;

pub use decision::{evaluate, CacheDecisionEngine, CacheStatus, Decision, DecisionKind};
pub use metadata::{CacheMetadata, LoadOutcome, UpdateRecord};
pub use store::{CacheKey, CacheStore, FsCacheStore};
