//! Sequential multi-analyst pipeline over chat completions.

use std::sync::Arc;

use async_trait::async_trait;

use super::openai::ChatModel;
use super::search::{render_hits, WebSearch};
use super::stages::{Stage, STAGES};
use super::{AnalysisEngine, AnalysisError, AnalysisInputs, AnalysisVariant};

/// Runs every [`Stage`] in order, feeding each the transcript so far.
///
/// Search failures are not fatal: the stage proceeds on model knowledge.
/// A failed chat completion fails the whole analysis.
pub struct CrewPipeline {
    variant: AnalysisVariant,
    chat: Arc<dyn ChatModel>,
    serper: Option<Arc<dyn WebSearch>>,
    brave: Option<Arc<dyn WebSearch>>,
}

impl CrewPipeline {
    pub fn new(
        variant: AnalysisVariant,
        chat: Arc<dyn ChatModel>,
        serper: Option<Arc<dyn WebSearch>>,
        brave: Option<Arc<dyn WebSearch>>,
    ) -> Self {
        Self {
            variant,
            chat,
            serper,
            brave,
        }
    }

    async fn search_context(&self, stage: Stage, inputs: &AnalysisInputs) -> String {
        let tools = stage.search_tools(self.variant);
        let mut selected: Vec<&Arc<dyn WebSearch>> = Vec::new();
        if tools.serper {
            selected.extend(self.serper.as_ref());
        }
        if tools.brave {
            selected.extend(self.brave.as_ref());
        }

        let query = stage.search_query(inputs);
        let mut context = String::new();
        for tool in selected {
            match tool.search(&query).await {
                Ok(hits) if !hits.is_empty() => context.push_str(&render_hits(tool.name(), &hits)),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        stage = stage.key(),
                        tool = tool.name(),
                        error = %e,
                        "Search failed, continuing without it"
                    );
                }
            }
        }
        context
    }
}

#[async_trait]
impl AnalysisEngine for CrewPipeline {
    async fn run_analysis(&self, inputs: &AnalysisInputs) -> Result<String, AnalysisError> {
        let mut outputs: Vec<String> = Vec::with_capacity(STAGES.len());

        for stage in STAGES {
            tracing::debug!(stage = stage.key(), role = stage.role(), "Running analysis stage");

            let context = self.search_context(stage, inputs).await;
            let prior = outputs.join("\n\n");
            let system = stage.system_prompt(inputs);
            let user = stage.user_prompt(inputs, &prior, &context);

            let output = self.chat.complete(&system, &user).await.map_err(|e| match e {
                AnalysisError::Failed(msg) => {
                    AnalysisError::Failed(format!("{} stage: {msg}", stage.key()))
                }
                other => other,
            })?;
            outputs.push(output.trim().to_string());
        }

        Ok(outputs.join("\n\n"))
    }

    fn name(&self) -> &str {
        match self.variant {
            AnalysisVariant::Full => "crew-full",
            AnalysisVariant::Reduced => "crew-reduced",
            AnalysisVariant::Fallback => "crew-fallback",
        }
    }
}
