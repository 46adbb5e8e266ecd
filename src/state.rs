use std::sync::Arc;

use crate::auth::SessionKeys;
use crate::config::Config;
use crate::store::{EventRepository, UserRepository};

/// Shared handler state. Cloned per request, so everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub events: Arc<dyn EventRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<SessionKeys>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        events: Arc<dyn EventRepository>,
        users: Arc<dyn UserRepository>,
        config: Config,
    ) -> Self {
        let sessions = SessionKeys::new(&config.session_secret, config.session_ttl_hours);
        Self {
            events,
            users,
            sessions: Arc::new(sessions),
            config: Arc::new(config),
        }
    }

    /// Wires both repositories to one backing store.
    pub fn with_store<S>(store: Arc<S>, config: Config) -> Self
    where
        S: EventRepository + UserRepository + 'static,
    {
        Self::new(store.clone(), store, config)
    }
}
