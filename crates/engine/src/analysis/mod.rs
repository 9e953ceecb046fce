//! External analysis collaborator.
//!
//! The executor only sees [`AnalysisEngine`]: one long-running call that
//! turns the buyer's inputs into a raw transcript. Which concrete engine runs
//! is decided once at startup by [`EngineFactory`] from [`EngineConfig`];
//! building an engine for a job may still fail, and the executor treats that
//! the same as a failed call.

mod config;
pub mod openai;
pub mod pipeline;
pub mod search;
pub mod stages;

use std::sync::Arc;

use async_trait::async_trait;
use carbuy_core::request::AnalysisRequest;

pub use config::{AnalysisVariant, EngineConfig, ENVIRONMENT_OK};
use openai::ChatClient;
use pipeline::CrewPipeline;
use search::{BraveSearch, SerperSearch, WebSearch};

/// Collaborator failure. Every variant ends the job as `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Failed to create analysis engine: {0}")]
    Unavailable(String),

    #[error("Analysis failed: {0}")]
    Failed(String),

    #[error("Analysis timed out after {0}s")]
    Timeout(u64),
}

/// Inputs handed to the collaborator for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisInputs {
    pub user_requirements: String,
    pub car_type: String,
    pub budget_range: String,
    pub current_state: String,
    /// Calendar day the analysis runs on, rendered `%B %d, %Y`.
    pub current_date: String,
}

impl AnalysisInputs {
    pub fn from_request(request: &AnalysisRequest) -> Self {
        Self {
            user_requirements: request.user_requirements.clone(),
            car_type: request.car_type.clone(),
            budget_range: request.budget_range.clone(),
            current_state: request.current_state.clone(),
            current_date: chrono::Local::now().format("%B %d, %Y").to_string(),
        }
    }
}

/// Long-running analysis producing a raw transcript.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    async fn run_analysis(&self, inputs: &AnalysisInputs) -> Result<String, AnalysisError>;

    fn name(&self) -> &str;
}

/// Builds an [`AnalysisEngine`] for each job.
pub trait AnalysisFactory: Send + Sync {
    fn build(&self) -> Result<Arc<dyn AnalysisEngine>, AnalysisError>;

    /// Which collaborator variant this factory produces.
    fn variant(&self) -> AnalysisVariant;
}

/// Config-driven factory for the chat-completion crew pipeline.
#[derive(Debug, Clone)]
pub struct EngineFactory {
    config: EngineConfig,
    variant: AnalysisVariant,
}

impl EngineFactory {
    pub fn new(config: EngineConfig) -> Self {
        let variant = config.resolve_variant();
        tracing::info!(variant = %variant, model = %config.openai_model, "Analysis engine selected");
        Self { config, variant }
    }
}

impl AnalysisFactory for EngineFactory {
    fn build(&self) -> Result<Arc<dyn AnalysisEngine>, AnalysisError> {
        let api_key = self
            .config
            .openai_api_key
            .clone()
            .ok_or_else(|| AnalysisError::Unavailable("OPENAI_API_KEY is not set".to_string()))?;

        let chat = ChatClient::new(
            api_key,
            self.config.openai_base_url.clone(),
            self.config.openai_model.clone(),
        )?;

        let mut serper: Option<Arc<dyn WebSearch>> = None;
        let mut brave: Option<Arc<dyn WebSearch>> = None;
        match self.variant {
            AnalysisVariant::Full => {
                serper = Some(Arc::new(SerperSearch::new(required_key(
                    &self.config.serper_api_key,
                    "SERPER_API_KEY",
                )?)?));
                brave = Some(Arc::new(BraveSearch::new(required_key(
                    &self.config.brave_api_key,
                    "BRAVE_API_KEY",
                )?)?));
            }
            AnalysisVariant::Reduced => {
                brave = Some(Arc::new(BraveSearch::new(required_key(
                    &self.config.brave_api_key,
                    "BRAVE_API_KEY",
                )?)?));
            }
            AnalysisVariant::Fallback => {}
        }

        Ok(Arc::new(CrewPipeline::new(
            self.variant,
            Arc::new(chat),
            serper,
            brave,
        )))
    }

    fn variant(&self) -> AnalysisVariant {
        self.variant
    }
}

fn required_key(key: &Option<String>, name: &str) -> Result<String, AnalysisError> {
    key.clone()
        .ok_or_else(|| AnalysisError::Unavailable(format!("{name} is not set")))
}
