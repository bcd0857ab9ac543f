//! Azure OpenAI embeddings adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::errors::{RagError, Result};
use crate::providers::EmbeddingProvider;

/// Request timeout for embedding calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for an Azure OpenAI embeddings deployment
#[derive(Debug, Clone)]
pub struct AzureEmbeddingClient {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    deployment: String,
    dimension: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl AzureEmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Arguments
    /// * `endpoint` - Azure OpenAI resource endpoint
    /// * `api_key` - API key for the resource
    /// * `api_version` - API version query parameter
    /// * `deployment` - Embedding model deployment name
    /// * `dimension` - Fixed output dimension D (1536 for ada-002)
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        deployment: impl Into<String>,
        dimension: usize,
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
            dimension,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }

    /// Strip newlines and surrounding whitespace before embedding
    fn clean(text: &str) -> String {
        text.replace('\n', " ").trim().to_string()
    }

    async fn request_embeddings(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(self.url())
            .header("api-key", &self.api_key)
            .json(&json!({ "input": inputs }))
            .send()
            .await
            .map_err(|e| RagError::Provider(format!("embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RagError::Provider(format!(
                "embedding API HTTP {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| RagError::Provider(format!("invalid embedding response: {}", e)))?;

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for AzureEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let cleaned = Self::clean(text);
        if cleaned.is_empty() {
            tracing::warn!("blank text submitted for embedding, returning zero vector");
            return Ok(vec![0.0; self.dimension]);
        }

        let mut embeddings = self.request_embeddings(vec![cleaned]).await?;
        embeddings
            .pop()
            .ok_or_else(|| RagError::Provider("embedding API returned no data".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let cleaned: Vec<String> = texts.iter().map(|t| Self::clean(t)).collect();

        // Only non-blank entries go to the API; blank entries become zero
        // vectors spliced back in input order
        let non_blank: Vec<String> = cleaned.iter().filter(|t| !t.is_empty()).cloned().collect();
        let fetched = if non_blank.is_empty() {
            Vec::new()
        } else {
            self.request_embeddings(non_blank).await?
        };
        let mut fetched = fetched.into_iter();

        let mut result = Vec::with_capacity(cleaned.len());
        for text in &cleaned {
            if text.is_empty() {
                result.push(vec![0.0; self.dimension]);
            } else {
                result.push(fetched.next().ok_or_else(|| {
                    RagError::Provider("embedding API returned fewer vectors than inputs".to_string())
                })?);
            }
        }

        Ok(result)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
