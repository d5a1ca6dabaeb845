use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub mod apex;
pub mod contact;
pub mod notifications;

use apex::{config::Settings, endpoints::root_endpoint};
use contact::endpoints::{contact_endpoint, contact_method_not_allowed, contact_preflight};
use notifications::transport::Transport;

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub transport: Arc<dyn Transport>,
}

impl AppState {
    pub fn new(settings: Settings, transport: Arc<dyn Transport>) -> Self {
        Self {
            settings: Arc::new(settings),
            transport,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_endpoint))
        .route(
            "/api/contact",
            post(contact_endpoint)
                .options(contact_preflight)
                .fallback(contact_method_not_allowed),
        )
        .with_state(state)
}
