//! Shared application state.

use std::sync::Arc;

use flowtutor_core::ClusterResult;
use flowtutor_inference::{ChatBackend, InvocationProfile, ModelInvoker, Stage};

use crate::config::{ClusterConfig, MutationConfig};
use crate::services::{ClusteringService, GraphMutationService, ResponseCache};

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub mutation: GraphMutationService,
    pub clustering: ClusteringService,
}

impl AppState {
    /// Wire the services.
    ///
    /// `fallback` serves the lenient mutation stage; pass the primary backend
    /// again when no secondary provider is configured.
    pub fn new(
        primary: Arc<dyn ChatBackend>,
        fallback: Arc<dyn ChatBackend>,
        mutation: &MutationConfig,
        cluster: &ClusterConfig,
        cache: ResponseCache<ClusterResult>,
    ) -> Self {
        let strict = Stage::new(
            ModelInvoker::new(Arc::clone(&primary), mutation.invocation_timeout),
            InvocationProfile::strict(&mutation.strict_model, mutation.temperature),
        );
        let lenient = Stage::new(
            ModelInvoker::new(fallback, mutation.invocation_timeout),
            InvocationProfile::lenient(&mutation.lenient_model, mutation.temperature),
        );
        let clustering = Stage::new(
            ModelInvoker::new(primary, cluster.invocation_timeout),
            InvocationProfile::strict(&cluster.model, cluster.temperature),
        );

        Self {
            mutation: GraphMutationService::new(strict, lenient),
            clustering: ClusteringService::new(clustering, cache),
        }
    }
}
