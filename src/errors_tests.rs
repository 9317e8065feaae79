//! Unit tests for error handling
//!
//! Tests error types, conversions, and error message formatting.

#[cfg(test)]
mod tests {
    use std::io;

    use crate::errors::PortfolioChatError;

    // ====== Error Type Tests ======

    #[test]
    fn test_config_error() {
        let error = PortfolioChatError::ConfigError("Invalid configuration".to_string());
        assert!(matches!(error, PortfolioChatError::ConfigError(_)));
        assert_eq!(error.to_string(), "Configuration error: Invalid configuration");
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let error = PortfolioChatError::DimensionMismatch {
            expected: 768,
            actual: 1536,
        };
        assert_eq!(
            error.to_string(),
            "Embedding dimension mismatch: expected 768, got 1536"
        );
    }

    #[test]
    fn test_service_errors() {
        let embedding = PortfolioChatError::EmbeddingError("Generation failed".to_string());
        let vector = PortfolioChatError::VectorStoreError("Query failed".to_string());
        let llm = PortfolioChatError::LlmError("API call failed".to_string());

        assert!(embedding.to_string().starts_with("Embedding error"));
        assert!(vector.to_string().starts_with("Vector store error"));
        assert!(llm.to_string().starts_with("LLM error"));
    }

    // ====== Error Conversion Tests ======

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err: PortfolioChatError = io_err.into();

        assert!(matches!(err, PortfolioChatError::Io(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: PortfolioChatError = json_err.into();

        assert!(matches!(err, PortfolioChatError::Serialization(_)));
    }

    #[test]
    fn test_error_from_toml() {
        let toml_err = toml::from_str::<toml::Table>("= broken").unwrap_err();
        let err: PortfolioChatError = toml_err.into();

        assert!(matches!(err, PortfolioChatError::TomlParsing(_)));
    }
}
