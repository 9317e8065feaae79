pub mod api;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod gemini;
pub mod http;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod vector;

#[cfg(test)]
mod errors_tests;

pub use config::AppConfig;
pub use errors::*;
