//! Azure OpenAI chat-completions adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::errors::{RagError, Result};
use crate::providers::{GenerationProvider, GenerationRequest};

/// Request timeout for completion calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client for an Azure OpenAI chat deployment
#[derive(Debug, Clone)]
pub struct AzureGenerationClient {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    deployment: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl AzureGenerationClient {
    /// Create a new generation client
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(RagError::Http)?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            deployment: deployment.into(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }

    /// Assemble the message array: system message, prior context, then the
    /// current prompt
    fn build_messages(request: &GenerationRequest) -> Vec<Value> {
        let mut messages = Vec::new();

        if let Some(system_message) = &request.system_message {
            messages.push(json!({
                "role": "system",
                "content": system_message,
            }));
        }

        for message in &request.context {
            messages.push(json!({
                "role": message.role,
                "content": message.content,
            }));
        }

        messages.push(json!({
            "role": "user",
            "content": request.prompt,
        }));

        messages
    }
}

#[async_trait]
impl GenerationProvider for AzureGenerationClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let messages = Self::build_messages(&request);

        let response = self
            .client
            .post(self.url())
            .header("api-key", &self.api_key)
            .json(&json!({
                "messages": messages,
                "temperature": request.temperature,
                "max_tokens": request.max_tokens,
            }))
            .send()
            .await
            .map_err(|e| RagError::Provider(format!("completion request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RagError::Provider(format!(
                "completion API HTTP {}: {}",
                status, body
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| RagError::Provider(format!("invalid completion response: {}", e)))?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RagError::Provider("completion API returned no content".to_string()))?;

        tracing::debug!(chars = answer.len(), "generated completion");
        Ok(answer)
    }

    fn model(&self) -> &str {
        &self.deployment
    }
}
