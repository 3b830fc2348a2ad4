pub mod config;
pub mod dto;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::EngineSettings;
use crate::services::{attempt_service::AttemptService, session_registry::SessionRegistry};

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(service: Arc<dyn AttemptService>, settings: EngineSettings) -> Self {
        Self {
            sessions: SessionRegistry::new(service, settings),
        }
    }
}
