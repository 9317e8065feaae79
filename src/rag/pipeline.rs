//! Complete RAG pipeline: Embed -> Retrieve -> Assemble -> Generate

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::config::FallbackConfig;
use crate::embeddings::Embedder;
use crate::embeddings::EmbeddingClient;
use crate::errors::PortfolioChatError;
use crate::errors::Result;
use crate::llm::GenerationParams;
use crate::llm::Generator;
use crate::llm::LlmService;
use crate::rag::context::ContextAssembler;
use crate::rag::prompts::PromptAssembler;
use crate::rag::prompts::PromptTemplate;
use crate::rag::retriever::RetrievedPassage;
use crate::rag::retriever::Retriever;
use crate::vector::ensure_dimension;
use crate::vector::PineconeIndex;
use crate::vector::VectorStore;

/// How a pipeline run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum RagOutcome {
    /// The model's answer, unmodified
    Answered(String),
    /// The query could not be embedded
    EmbeddingUnavailable,
    /// The index returned no passage with text
    NoContextFound,
    /// The index could not be queried
    RetrievalUnavailable,
    /// The model call failed
    GenerationUnavailable,
}

impl RagOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }

    /// User-facing text for this outcome
    #[must_use]
    pub fn text<'a>(&'a self, fallbacks: &'a FallbackConfig) -> &'a str {
        match self {
            Self::Answered(text) => text,
            Self::EmbeddingUnavailable => &fallbacks.embedding_unavailable,
            Self::NoContextFound => &fallbacks.no_context_found,
            Self::RetrievalUnavailable | Self::GenerationUnavailable => {
                &fallbacks.knowledge_base_unavailable
            }
        }
    }
}

/// Tunables for a [`RagService`]
#[derive(Debug, Clone)]
pub struct RagOptions {
    pub top_k: usize,
    pub params: GenerationParams,
    pub template: PromptTemplate,
    pub fallbacks: FallbackConfig,
}

impl RagOptions {
    /// Options from configuration, loading the prompt template file if one is set
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let template = match &config.rag.prompt_template_path {
            Some(path) => PromptTemplate::from_file(path)?,
            None => PromptTemplate::default(),
        };

        Ok(Self {
            top_k: config.rag.top_k,
            params: GenerationParams::from_config(&config.llm),
            template,
            fallbacks: config.rag.fallbacks.clone(),
        })
    }
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            params: GenerationParams::default(),
            template: PromptTemplate::default(),
            fallbacks: FallbackConfig::default(),
        }
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RagResponse {
    pub query: String,
    pub outcome: RagOutcome,
    /// Passages the answer was grounded on; empty when retrieval did not succeed
    pub sources: Vec<RetrievedPassage>,
}

/// Complete RAG service
pub struct RagService {
    embedder: Arc<dyn Embedder>,
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    prompts: PromptAssembler,
    top_k: usize,
    params: GenerationParams,
    fallbacks: FallbackConfig,
}

impl RagService {
    /// Create from existing services
    #[must_use]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
        options: RagOptions,
    ) -> Self {
        Self {
            embedder,
            retriever: Retriever::new(store),
            generator,
            prompts: PromptAssembler::new(options.template, ContextAssembler::default()),
            top_k: options.top_k,
            params: options.params,
            fallbacks: options.fallbacks,
        }
    }

    /// Create a RAG service talking to Gemini and Pinecone
    ///
    /// # Errors
    /// - HTTP client configuration errors
    /// - Index host lookup failures
    /// - Index dimension differing from `embeddings.dimension`
    /// - Unreadable or invalid prompt template file
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let embedder = Arc::new(EmbeddingClient::from_config(config)?);
        let store = Arc::new(PineconeIndex::from_config(config).await?);
        let generator = Arc::new(LlmService::from_config(config)?);

        ensure_dimension(store.as_ref(), config.embedding_dimension()).await?;

        Ok(Self::new(
            embedder,
            store,
            generator,
            RagOptions::from_config(config)?,
        ))
    }

    /// Answer a question, degrading to a fallback text on any backend failure
    ///
    /// # Errors
    /// - `InvalidInput` for a blank question; backend failures never surface here
    pub async fn answer(&self, query: &str) -> Result<String> {
        let response = self.query(query).await?;
        Ok(self.render(&response.outcome).to_string())
    }

    /// Run the pipeline and keep the retrieved sources
    ///
    /// # Errors
    /// - `InvalidInput` for a blank question
    pub async fn query(&self, query: &str) -> Result<RagResponse> {
        if query.trim().is_empty() {
            return Err(PortfolioChatError::InvalidInput(
                "Message cannot be empty".to_string(),
            ));
        }

        info!("Processing RAG query: {}", query);
        let (outcome, sources) = self.execute(query).await;

        if outcome.is_answered() {
            info!("RAG query completed successfully");
        }

        Ok(RagResponse {
            query: query.to_string(),
            outcome,
            sources,
        })
    }

    /// Run the pipeline and report how it ended
    pub async fn run(&self, query: &str) -> RagOutcome {
        self.execute(query).await.0
    }

    async fn execute(&self, query: &str) -> (RagOutcome, Vec<RetrievedPassage>) {
        // Step 1: Embed the query
        debug!("Step 1: Embedding query");
        let embedding = match self.embedder.embed(query).await {
            Ok(embedding) if !embedding.is_empty() => embedding,
            Ok(_) => {
                warn!("Embedding service returned an empty vector");
                return (RagOutcome::EmbeddingUnavailable, Vec::new());
            }
            Err(e) => {
                error!("Error generating embedding: {}", e);
                return (RagOutcome::EmbeddingUnavailable, Vec::new());
            }
        };

        // Step 2: Retrieve passages
        debug!("Step 2: Retrieving top {} passages", self.top_k);
        let passages = match self.retriever.retrieve(&embedding, self.top_k).await {
            Ok(passages) => passages,
            Err(e) => {
                error!("Error querying vector store: {}", e);
                return (RagOutcome::RetrievalUnavailable, Vec::new());
            }
        };

        if passages.is_empty() {
            info!("No passages with text found for query");
            return (RagOutcome::NoContextFound, passages);
        }
        debug!("Retrieved {} passages", passages.len());

        // Step 3: Assemble the prompt
        debug!("Step 3: Assembling prompt");
        let chunks: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        let prompt = self.prompts.assemble(&chunks, query);

        // Step 4: Generate the answer
        debug!("Step 4: Generating answer");
        match self.generator.generate(&prompt, self.params).await {
            Ok(answer) => (RagOutcome::Answered(answer), passages),
            Err(e) => {
                error!("Error generating answer: {}", e);
                (RagOutcome::GenerationUnavailable, passages)
            }
        }
    }

    /// User-facing text for an outcome under this service's fallback messages
    #[must_use]
    pub fn render<'a>(&'a self, outcome: &'a RagOutcome) -> &'a str {
        outcome.text(&self.fallbacks)
    }

    /// Get prompt assembler reference
    #[must_use]
    pub const fn prompts(&self) -> &PromptAssembler {
        &self.prompts
    }
}

impl RagResponse {
    /// Get a formatted string representation
    #[must_use]
    pub fn format(&self, fallbacks: &FallbackConfig) -> String {
        let mut output = String::new();
        output.push_str(&format!("Query: {}\n\n", self.query));
        output.push_str(&format!("Answer:\n{}\n\n", self.outcome.text(fallbacks)));
        output.push_str(&format!("Sources ({} passages):\n", self.sources.len()));

        for source in self.sources.iter().take(5) {
            let preview: String = source.text.chars().take(80).collect();
            output.push_str(&format!(
                "  {}. [{}] (Score: {:.2}) {}\n",
                source.rank,
                source.id,
                source.score,
                preview.replace('\n', " ")
            ));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_text_mapping() {
        let fallbacks = FallbackConfig {
            embedding_unavailable: "brain".to_string(),
            no_context_found: "nothing".to_string(),
            knowledge_base_unavailable: "later".to_string(),
        };

        assert_eq!(RagOutcome::Answered("Hello".into()).text(&fallbacks), "Hello");
        assert_eq!(RagOutcome::EmbeddingUnavailable.text(&fallbacks), "brain");
        assert_eq!(RagOutcome::NoContextFound.text(&fallbacks), "nothing");
        assert_eq!(RagOutcome::RetrievalUnavailable.text(&fallbacks), "later");
        assert_eq!(RagOutcome::GenerationUnavailable.text(&fallbacks), "later");
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(
            serde_json::to_value(RagOutcome::Answered("Hi".into())).unwrap(),
            serde_json::json!({"kind": "answered", "text": "Hi"})
        );
        assert_eq!(
            serde_json::to_value(RagOutcome::NoContextFound).unwrap(),
            serde_json::json!({"kind": "no_context_found"})
        );
    }

    #[test]
    fn test_response_format_lists_sources() {
        let response = RagResponse {
            query: "patents?".to_string(),
            outcome: RagOutcome::Answered("Three patents.".to_string()),
            sources: vec![RetrievedPassage {
                id: "2".to_string(),
                text: "Patent: LexiBot\nfiled 2024".to_string(),
                rank: 1,
                score: 0.87,
            }],
        };

        let formatted = response.format(&FallbackConfig::default());
        assert!(formatted.contains("Answer:\nThree patents."));
        assert!(formatted.contains("  1. [2] (Score: 0.87) Patent: LexiBot filed 2024"));
    }
}
