//! Text generation through a hosted chat-completion model

pub mod client;

use async_trait::async_trait;

pub use client::LlmService;

use crate::config::LlmConfig;
use crate::errors::Result;

/// Sampling parameters sent with each generation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

/// Produces free text for a prompt.
///
/// Failures are returned to the caller; implementations never substitute
/// fallback text themselves.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String>;
}
