use std::sync::Arc;

use crate::gateway::AiGateway;
use crate::profile::store::ProfileRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Sole owner of persisted profiles; handlers only ever see clones.
    pub store: Arc<dyn ProfileRepository>,
    pub gateway: AiGateway,
}
