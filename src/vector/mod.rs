//! Vector store access
//!
//! The pipeline only ever reads from the index; the ingestion job is the only
//! writer. Both go through the [`VectorStore`] trait.

pub mod pinecone;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

pub use pinecone::PineconeIndex;

use crate::errors::PortfolioChatError;
use crate::errors::Result;

/// Metadata key holding the original passage text
pub const TEXT_METADATA_KEY: &str = "text";

/// One nearest-neighbor hit as reported by the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl VectorMatch {
    /// Stored passage text, if the record carries one
    pub fn text(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.get(TEXT_METADATA_KEY))
            .and_then(Value::as_str)
    }
}

/// A record written to the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Map<String, Value>,
}

impl VectorRecord {
    /// Record whose metadata holds only the passage text
    pub fn with_text(id: impl Into<String>, values: Vec<f32>, text: &str) -> Self {
        let mut metadata = Map::new();
        metadata.insert(TEXT_METADATA_KEY.to_string(), Value::String(text.to_string()));
        Self {
            id: id.into(),
            values,
            metadata,
        }
    }
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Top-`top_k` matches for `vector`, most similar first, metadata included
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>>;

    /// Insert or overwrite records by id; returns the number upserted
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize>;

    /// Dimensionality the index was created with
    async fn dimension(&self) -> Result<usize>;
}

/// Fail with `DimensionMismatch` unless the index matches the embedding size
pub async fn ensure_dimension(store: &dyn VectorStore, expected: usize) -> Result<()> {
    let actual = store.dimension().await?;
    if actual != expected {
        return Err(PortfolioChatError::DimensionMismatch { expected, actual });
    }
    debug!("Index dimension {} matches embeddings", actual);
    Ok(())
}
