use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::Pipeline;

/// Shared application state injected into all route handlers via Axum
/// extractors. The pipeline owns every capability (cache, record store,
/// artifact store, gateway) — handlers never touch clients directly.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Retained for handlers that surface configuration (plan limits,
    /// model map).
    #[allow(dead_code)]
    pub config: Config,
}
