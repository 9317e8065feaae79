//! Gemini embedding API client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::config::EmbeddingsConfig;
use crate::config::HttpConfig;
use crate::embeddings::Embedder;
use crate::embeddings::Embedding;
use crate::errors::PortfolioChatError;
use crate::errors::Result;
use crate::gemini::model_resource;
use crate::gemini::GeminiContent;
use crate::http::build_client;
use crate::http::RetryPolicy;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: GeminiContent,
    output_dimensionality: usize,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

/// Client for the `embedContent` endpoint
pub struct EmbeddingClient {
    model: String,
    endpoint: String,
    api_key: String,
    dimension: usize,
    client: Client,
    retry: RetryPolicy,
}

impl EmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(config: &EmbeddingsConfig, http: &HttpConfig) -> Result<Self> {
        let client = build_client(http.timeout())?;

        Ok(Self {
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            dimension: config.dimension,
            client,
            retry: RetryPolicy::from_config(http),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.embeddings, &config.http)
    }

    /// Dimensionality requested from the service
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Generate embedding for a single text
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication failures)
    /// - Invalid API responses (malformed JSON, wrong embedding dimensions)
    pub async fn generate(&self, text: &str) -> Result<Embedding> {
        let model = model_resource(&self.model);
        let url = format!("{}/{}:embedContent", self.endpoint, model);
        debug!("Calling Gemini embeddings API: {}", url);

        let request = EmbedContentRequest {
            model: &model,
            content: GeminiContent::text(text),
            output_dimensionality: self.dimension,
        };

        let response = self
            .retry
            .send(
                self.client
                    .post(&url)
                    .query(&[("key", self.api_key.as_str())])
                    .json(&request),
            )
            .await
            .map_err(|e| PortfolioChatError::EmbeddingError(format!("Gemini API error: {e}")))?;

        let result: EmbedContentResponse = response.json().await.map_err(|e| {
            PortfolioChatError::EmbeddingError(format!("Failed to parse response: {e}"))
        })?;

        let values = result.embedding.values;
        if values.len() != self.dimension {
            return Err(PortfolioChatError::DimensionMismatch {
                expected: self.dimension,
                actual: values.len(),
            });
        }

        Ok(values)
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.generate(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = EmbedContentRequest {
            model: "models/gemini-embedding-001",
            content: GeminiContent::text("Patents"),
            output_dimensionality: 768,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "models/gemini-embedding-001",
                "content": {"parts": [{"text": "Patents"}]},
                "outputDimensionality": 768
            })
        );
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let config = EmbeddingsConfig {
            endpoint: "http://localhost:9999/v1beta/".to_string(),
            ..EmbeddingsConfig::default()
        };
        let client = EmbeddingClient::new(&config, &HttpConfig::default()).unwrap();
        assert_eq!(client.endpoint, "http://localhost:9999/v1beta");
        assert_eq!(client.dimension(), 768);
    }

    #[tokio::test]
    #[ignore = "Requires API key"]
    async fn test_gemini_embedding() {
        let config = EmbeddingsConfig {
            api_key: std::env::var("GOOGLE_API_KEY").unwrap_or_default(),
            ..EmbeddingsConfig::default()
        };
        let client = EmbeddingClient::new(&config, &HttpConfig::default()).unwrap();

        let embedding = client.generate("Hello, world!").await.unwrap();
        assert_eq!(embedding.len(), 768);
    }
}
