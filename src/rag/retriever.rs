//! Nearest-neighbor retrieval of knowledge-base passages

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::errors::Result;
use crate::vector::VectorStore;

/// A passage returned for one query, ranked from 1 (most similar)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedPassage {
    pub id: String,
    pub text: String,
    pub rank: usize,
    pub score: f32,
}

/// Retriever over a vector store
pub struct Retriever {
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    /// Create a new retriever
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Top-`top_k` passages in the store's similarity order.
    ///
    /// Matches without text metadata are skipped; ranks are assigned over the
    /// passages that remain. No deduplication or re-ranking happens here.
    pub async fn retrieve(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievedPassage>> {
        let matches = self.store.query(vector, top_k).await?;
        let total = matches.len();

        let passages: Vec<RetrievedPassage> = matches
            .into_iter()
            .filter_map(|m| {
                let text = m.text()?.to_string();
                Some((m.id, text, m.score))
            })
            .enumerate()
            .map(|(idx, (id, text, score))| RetrievedPassage {
                id,
                text,
                rank: idx + 1,
                score,
            })
            .collect();

        if passages.len() < total {
            debug!(
                "Skipped {} of {} matches without text metadata",
                total - passages.len(),
                total
            );
        }

        Ok(passages)
    }
}
