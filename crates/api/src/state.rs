use std::sync::Arc;

use carbuy_engine::{EngineConfig, JobExecutor, JobRegistry};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Job records, shared with the executor and the reaper.
    pub registry: Arc<JobRegistry>,
    /// Starts analysis jobs in the background.
    pub executor: JobExecutor,
}

impl AppState {
    pub fn engine_config(&self) -> &EngineConfig {
        &self.config.engine
    }
}
