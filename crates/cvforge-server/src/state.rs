use std::sync::Arc;

use crate::gotenberg::GotenbergClient;

/// Shared application state accessible to all handlers
#[derive(Clone)]
pub struct AppState {
    pub gotenberg: Arc<GotenbergClient>,
}

impl AppState {
    pub fn new(gotenberg: GotenbergClient) -> Self {
        Self {
            gotenberg: Arc::new(gotenberg),
        }
    }
}
