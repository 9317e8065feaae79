//! Gemini `generateContent` and model-listing client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::config::HttpConfig;
use crate::config::LlmConfig;
use crate::errors::PortfolioChatError;
use crate::errors::Result;
use crate::gemini::model_resource;
use crate::gemini::GeminiContent;
use crate::http::build_client;
use crate::http::RetryPolicy;
use crate::llm::GenerationParams;
use crate::llm::Generator;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    next_page_token: Option<String>,
}

/// Model entry returned by the `models` listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

/// LLM service backed by the Gemini API
#[derive(Clone)]
pub struct LlmService {
    model: String,
    endpoint: String,
    api_key: String,
    client: Client,
    retry: RetryPolicy,
}

impl LlmService {
    pub fn new(config: &LlmConfig, http: &HttpConfig) -> Result<Self> {
        let client = build_client(http.timeout())?;

        Ok(Self {
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
            retry: RetryPolicy::from_config(http),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.llm, &config.http)
    }

    /// Generate a completion for a single user turn
    ///
    /// # Errors
    /// - API failures (network errors, quota, authentication)
    /// - Responses without any candidate text (e.g. blocked by safety filters)
    pub async fn generate_with_params(
        &self,
        prompt: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent",
            self.endpoint,
            model_resource(&self.model)
        );
        debug!("Calling Gemini generateContent API: {}", url);

        let request = GenerateContentRequest {
            contents: vec![GeminiContent::user_text(prompt)],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens,
            },
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
            .map_err(|e| PortfolioChatError::LlmError(format!("Gemini API error: {e}")))?;

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| PortfolioChatError::LlmError(format!("Failed to parse response: {e}")))?;

        let candidate = result
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| PortfolioChatError::LlmError("No candidates in response".to_string()))?;

        let text = candidate
            .content
            .map(|content| content.joined_text())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(PortfolioChatError::LlmError(format!(
                "Empty completion (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }

    /// List every model visible to the API key, following pagination
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/models", self.endpoint);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .query(&[("key", self.api_key.as_str())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = self
                .retry
                .send(request)
                .await
                .map_err(|e| PortfolioChatError::LlmError(format!("Gemini API error: {e}")))?;

            let page: ListModelsResponse = response.json().await.map_err(|e| {
                PortfolioChatError::LlmError(format!("Failed to parse response: {e}"))
            })?;

            models.extend(page.models);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(models)
    }
}

#[async_trait]
impl Generator for LlmService {
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String> {
        self.generate_with_params(prompt, params.temperature, params.max_output_tokens)
            .await
    }
}
