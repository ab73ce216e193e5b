//! Shared application state — everything a service handler needs, wired
//! once at startup and handed to every RPC as `Arc<AppState>`.

use crate::config::Config;
use crate::core::ratelimit::RateLimiter;
use crate::core::reconcile::Reconciler;
use crate::runtime::ContainerRuntime;
use std::sync::Arc;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub runtime: Arc<dyn ContainerRuntime>,
    pub reconciler: Reconciler,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: Config, runtime: Arc<dyn ContainerRuntime>) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit_requests, config.rate_limit_window_secs);
        let reconciler = Reconciler::new(runtime.clone(), config.clone());
        Self {
            config,
            runtime,
            reconciler,
            rate_limiter,
        }
    }
}
