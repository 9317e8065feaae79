//! Substitutable fakes for the pipeline's external services
#![allow(dead_code)]

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use portfolio_chat::embeddings::Embedder;
use portfolio_chat::embeddings::Embedding;
use portfolio_chat::llm::GenerationParams;
use portfolio_chat::llm::Generator;
use portfolio_chat::rag::RagOptions;
use portfolio_chat::rag::RagService;
use portfolio_chat::vector::VectorMatch;
use portfolio_chat::vector::VectorRecord;
use portfolio_chat::vector::VectorStore;
use portfolio_chat::PortfolioChatError;
use portfolio_chat::Result;
use serde_json::json;

pub struct FakeEmbedder {
    response: Option<Embedding>,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn returning(vector: Embedding) -> Arc<Self> {
        Arc::new(Self {
            response: Some(vector),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            response: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            // Encode the text length so batch callers can tell chunks apart
            Some(vector) if vector.is_empty() => Ok(Vec::new()),
            Some(vector) => {
                let mut vector = vector.clone();
                vector[0] = text.len() as f32;
                Ok(vector)
            }
            None => Err(PortfolioChatError::EmbeddingError(
                "API key not valid".to_string(),
            )),
        }
    }
}

pub struct FakeStore {
    matches: Option<Vec<VectorMatch>>,
    dimension: usize,
    pub queries: Mutex<Vec<usize>>,
    pub upserts: Mutex<Vec<Vec<VectorRecord>>>,
}

impl FakeStore {
    pub fn with_matches(matches: Vec<VectorMatch>) -> Arc<Self> {
        Arc::new(Self {
            matches: Some(matches),
            dimension: 768,
            queries: Mutex::new(Vec::new()),
            upserts: Mutex::new(Vec::new()),
        })
    }

    pub fn with_texts(texts: &[&str]) -> Arc<Self> {
        Self::with_matches(
            texts
                .iter()
                .enumerate()
                .map(|(idx, text)| text_match(&idx.to_string(), 0.9 - idx as f32 * 0.1, text))
                .collect(),
        )
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            matches: None,
            dimension: 768,
            queries: Mutex::new(Vec::new()),
            upserts: Mutex::new(Vec::new()),
        })
    }

    pub fn query_calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn upserted_batches(&self) -> Vec<Vec<VectorRecord>> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn query(&self, _vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>> {
        self.queries.lock().unwrap().push(top_k);
        match &self.matches {
            Some(matches) => Ok(matches.iter().take(top_k).cloned().collect()),
            None => Err(PortfolioChatError::VectorStoreError(
                "Pinecone API error: HTTP 503 Service Unavailable".to_string(),
            )),
        }
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
        self.upserts.lock().unwrap().push(records.to_vec());
        Ok(records.len())
    }

    async fn dimension(&self) -> Result<usize> {
        Ok(self.dimension)
    }
}

pub struct FakeGenerator {
    response: Option<String>,
    pub prompts: Mutex<Vec<String>>,
    pub params: Mutex<Vec<GenerationParams>>,
}

impl FakeGenerator {
    pub fn returning(text: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            response: None,
            prompts: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.params.lock().unwrap().push(params);
        self.response
            .clone()
            .ok_or_else(|| PortfolioChatError::LlmError("quota exceeded".to_string()))
    }
}

pub fn text_match(id: &str, score: f32, text: &str) -> VectorMatch {
    serde_json::from_value(json!({
        "id": id,
        "score": score,
        "metadata": {"text": text}
    }))
    .unwrap()
}

pub fn bare_match(id: &str, score: f32) -> VectorMatch {
    serde_json::from_value(json!({"id": id, "score": score})).unwrap()
}

pub fn service(
    embedder: Arc<FakeEmbedder>,
    store: Arc<FakeStore>,
    generator: Arc<FakeGenerator>,
) -> RagService {
    RagService::new(embedder, store, generator, RagOptions::default())
}
