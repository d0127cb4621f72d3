pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod render;
pub mod telegram;
pub mod webhook;

use axum::{Router, routing};
use std::sync::Arc;

use config::ConfigStore;
use telegram::TelegramClient;

/// Everything a request handler needs. Immutable after startup, so handlers
/// share it without locking.
pub struct AppState {
    pub store: ConfigStore,
    pub telegram: TelegramClient,
}

impl AppState {
    pub fn new(store: ConfigStore, telegram: TelegramClient) -> Self {
        Self { store, telegram }
    }
}

pub type SharedState = Arc<AppState>;

/// Build the router. Webhooks are accepted on any path.
pub fn app(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::post(api::handle_webhook))
        .route("/{*path}", routing::post(api::handle_webhook))
        .with_state(state)
}
