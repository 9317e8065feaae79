//! RAG (Retrieval-Augmented Generation) module
//!
//! This module answers questions about the portfolio knowledge base:
//! - Query embedding through an [`Embedder`](crate::embeddings::Embedder)
//! - Nearest-neighbor retrieval from a [`VectorStore`](crate::vector::VectorStore)
//! - Context and prompt assembly around a persona template
//! - LLM-based answer generation, with a fixed fallback text per failure kind
//!
//! # Examples
//!
//! ```rust,no_run
//! use portfolio_chat::rag::RagService;
//! use portfolio_chat::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = RagService::from_config(&config).await?;
//!
//!     let answer = service.answer("What are Mrigank's patents?").await?;
//!     println!("Answer: {}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod pipeline;
pub mod prompts;
pub mod retriever;

pub use context::ContextAssembler;
pub use context::CONTEXT_SEPARATOR;
pub use pipeline::RagOptions;
pub use pipeline::RagOutcome;
pub use pipeline::RagResponse;
pub use pipeline::RagService;
pub use prompts::PromptAssembler;
pub use prompts::PromptTemplate;
pub use retriever::RetrievedPassage;
pub use retriever::Retriever;
