//! Service layer for business logic.

pub mod clustering;
pub mod graph_mutation;
pub mod response_cache;

pub use clustering::{ClusterOutcome, ClusteringService};
pub use graph_mutation::{GraphMutationService, MutationOutcome};
pub use response_cache::{
    CacheEntry, CacheStats, Clock, ManualClock, ResponseCache, SweeperHandle, SystemClock,
};
