use std::sync::Arc;

use service::{storage::KvBackend, VersionService};

/// Shared handler state; cloned per request.
#[derive(Clone)]
pub struct ServerState {
    pub versions: VersionService,
}

impl ServerState {
    pub fn new(store: Arc<dyn KvBackend>) -> Self {
        Self { versions: VersionService::new(store) }
    }
}
