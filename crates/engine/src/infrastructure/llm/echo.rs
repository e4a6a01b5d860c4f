//! Offline model that answers with its own prompt.

use async_trait::async_trait;

use crate::infrastructure::ports::{LlmError, LlmPort, LlmRequest, LlmResponse};

/// Returns the prompt, prefixed with the system prompt when there is one.
/// Useful to exercise the whole loop without a model server.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoLlm;

#[async_trait]
impl LlmPort for EchoLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let prompt = request.prompt_text();
        let text = match &request.system_prompt {
            Some(system) => format!("[system: {system}] {prompt}"),
            None => prompt,
        };
        Ok(LlmResponse::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_prompt_with_system_prefix() {
        let response = EchoLlm
            .generate(LlmRequest::prompt("Describe the gate").with_system_prompt("Be brief"))
            .await
            .expect("echo never fails");

        assert_eq!(response.content, "[system: Be brief] Describe the gate");
    }
}
