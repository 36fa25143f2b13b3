//! Application state shared across handlers.

use crate::auth::AuthService;
use crate::config::Config;
use crate::store::Store;
use std::sync::Arc;

/// Shared application state.
///
/// Constructed once at startup; handlers receive clones. There is no
/// module-level singleton.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Catalog store handle.
    pub store: Store,
    /// Authentication service.
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: Config, store: Store, auth: AuthService) -> Self {
        Self {
            config: Arc::new(config),
            store,
            auth: Arc::new(auth),
        }
    }
}
