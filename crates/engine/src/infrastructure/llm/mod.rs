//! Text generation gateways.

mod echo;
mod openai;

use std::sync::Arc;

pub use echo::EchoLlm;
pub use openai::OpenAiCompatibleClient;

use crate::infrastructure::config::{LlmConfig, LlmProvider};
use crate::infrastructure::ports::LlmPort;

/// Builds the gateway selected by `LLM_PROVIDER`.
pub fn build_llm(config: &LlmConfig) -> Arc<dyn LlmPort> {
    match config.provider {
        LlmProvider::Local => {
            tracing::info!("Using local echo model");
            Arc::new(EchoLlm)
        }
        LlmProvider::OpenAi | LlmProvider::Ollama => {
            tracing::info!(
                provider = ?config.provider,
                base_url = %config.base_url,
                model = %config.model,
                "Using OpenAI-compatible model"
            );
            Arc::new(OpenAiCompatibleClient::new(config))
        }
    }
}
