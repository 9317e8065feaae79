//! Embeddings generation module
//!
//! Turns text into fixed-length vectors through the hosted Gemini embedding API.
//! The [`Embedder`] trait is the seam the RAG pipeline and the ingestion job
//! depend on, so both can run against fakes in tests.
//!
//! # Examples
//!
//! ```rust,no_run
//! use portfolio_chat::config::AppConfig;
//! use portfolio_chat::embeddings::{Embedder, EmbeddingClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let client = EmbeddingClient::from_config(&config)?;
//!
//!     let embedding = client.embed("Hello, world!").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use futures::TryStreamExt;

pub use client::EmbeddingClient;

use crate::errors::Result;

/// Embedding vector as produced by the embedding service
pub type Embedding = Vec<f32>;

/// Converts text into an embedding vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single non-empty text
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Embed texts one after another, stopping at the first failure
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        stream::iter(texts)
            .then(|text| self.embed(text))
            .try_collect()
            .await
    }
}
