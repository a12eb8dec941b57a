//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::services::AuthService;

/// State extracted by handlers and middleware via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(auth: AuthService) -> Self {
        Self {
            auth: Arc::new(auth),
        }
    }
}
