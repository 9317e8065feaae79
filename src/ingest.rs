//! Offline population of the vector index from a flat knowledge-base file

use std::path::Path;

use tracing::info;

use crate::embeddings::Embedder;
use crate::errors::PortfolioChatError;
use crate::errors::Result;
use crate::vector::VectorRecord;
use crate::vector::VectorStore;

/// Blank-line delimiter between knowledge-base chunks
pub const CHUNK_DELIMITER: &str = "\n\n";

/// Split text into trimmed, non-empty chunks on blank lines
pub fn chunk_text(content: &str) -> Vec<String> {
    content
        .replace("\r\n", "\n")
        .split(CHUNK_DELIMITER)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Load text file and split into chunks by double newlines
pub fn load_and_chunk<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PortfolioChatError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Knowledge base file not found: {}", path.display()),
        )));
    }

    let content = std::fs::read_to_string(path)?;
    Ok(chunk_text(&content))
}

/// Pair chunks with their embeddings.
///
/// Ids are the chunk positions, so re-ingesting the same file overwrites the
/// previous records instead of duplicating them.
pub fn build_records(chunks: &[String], embeddings: Vec<Vec<f32>>) -> Vec<VectorRecord> {
    chunks
        .iter()
        .zip(embeddings)
        .enumerate()
        .map(|(idx, (chunk, values))| VectorRecord::with_text(idx.to_string(), values, chunk))
        .collect()
}

/// Statistics from an ingestion run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub chunks: usize,
    pub batches: usize,
    pub upserted: usize,
}

/// Embed every chunk of `path` and upsert the records in batches of `batch_size`
///
/// # Errors
/// - Missing or unreadable knowledge-base file
/// - Any embedding failure (nothing is written in that case)
/// - Vector store upsert failures
pub async fn ingest_knowledge_base(
    path: &Path,
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    batch_size: usize,
) -> Result<IngestStats> {
    if batch_size == 0 {
        return Err(PortfolioChatError::ConfigError(
            "ingest batch size must be greater than 0".to_string(),
        ));
    }

    info!("[1/3] Loading data from: {}", path.display());
    let chunks = load_and_chunk(path)?;
    info!("Loaded {} chunks", chunks.len());

    info!("[2/3] Generating embeddings...");
    let embeddings = embedder.embed_batch(&chunks).await?;
    let records = build_records(&chunks, embeddings);
    info!("Generated {} embeddings", records.len());

    info!("[3/3] Upserting to vector store...");
    let mut stats = IngestStats {
        chunks: chunks.len(),
        ..IngestStats::default()
    };

    for (batch_idx, batch) in records.chunks(batch_size).enumerate() {
        let upserted = store.upsert(batch).await?;
        stats.batches += 1;
        stats.upserted += upserted;
        info!(
            "Upserted batch {}/{} ({} vectors)",
            batch_idx + 1,
            records.len().div_ceil(batch_size),
            upserted
        );
    }

    info!(
        "Knowledge base ingested: {} chunks, {} vectors in {} batches",
        stats.chunks, stats.upserted, stats.batches
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_splits_on_blank_lines() {
        let content = "About Mrigank\nFull stack dev.\n\n\n  Patents: 3  \n\n\n\nDASES\r\n\r\nLexiBot\n";
        assert_eq!(
            chunk_text(content),
            vec![
                "About Mrigank\nFull stack dev.",
                "Patents: 3",
                "DASES",
                "LexiBot"
            ]
        );
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("\n\n   \n\n").is_empty());
    }

    #[test]
    fn test_build_records_uses_positional_ids() {
        let chunks = vec!["first".to_string(), "second".to_string()];
        let records = build_records(&chunks, vec![vec![0.1], vec![0.2]]);

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["0", "1"]);
        assert_eq!(records[1].metadata["text"], "second");

        let again = build_records(&chunks, vec![vec![0.3], vec![0.4]]);
        assert_eq!(again[0].id, records[0].id);
    }

    #[test]
    fn test_load_and_chunk_missing_file() {
        let err = load_and_chunk("/nonexistent/knowledge_base.txt").unwrap_err();
        assert!(matches!(err, PortfolioChatError::Io(_)));
    }
}
