//! Shared state injected into every handler.

use std::sync::Arc;

use crate::application::services::{DistributedCounter, UrlService};
use crate::infrastructure::cache::CacheService;

#[derive(Clone)]
pub struct AppState {
    pub url_service: Arc<UrlService>,
    pub counter: Arc<DistributedCounter>,
    pub cache: Arc<dyn CacheService>,
}
