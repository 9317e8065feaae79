//! Pinecone index client (data plane plus host lookup on the control plane)

use async_trait::async_trait;
use reqwest::Client;
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::config::HttpConfig;
use crate::config::VectorStoreConfig;
use crate::errors::PortfolioChatError;
use crate::errors::Result;
use crate::http::build_client;
use crate::http::RetryPolicy;
use crate::vector::VectorMatch;
use crate::vector::VectorRecord;
use crate::vector::VectorStore;

const API_VERSION: &str = "2024-07";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Deserialize)]
struct IndexStats {
    dimension: usize,
}

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

/// Handle to one Pinecone index
pub struct PineconeIndex {
    host: String,
    api_key: String,
    client: Client,
    retry: RetryPolicy,
}

impl PineconeIndex {
    /// Create a handle for an index whose data-plane host is already known
    pub fn new(host: &str, api_key: &str, http: &HttpConfig) -> Result<Self> {
        let client = build_client(http.timeout())?;

        Ok(Self {
            host: normalize_host(host),
            api_key: api_key.to_string(),
            client,
            retry: RetryPolicy::from_config(http),
        })
    }

    /// Create a handle, asking the control plane for the host when it is not configured
    pub async fn connect(config: &VectorStoreConfig, http: &HttpConfig) -> Result<Self> {
        if let Some(host) = &config.index_host {
            return Self::new(host, &config.api_key, http);
        }

        let client = build_client(http.timeout())?;
        let url = format!(
            "{}/indexes/{}",
            config.control_plane_endpoint.trim_end_matches('/'),
            config.index_name
        );
        debug!("Resolving Pinecone index host: {}", url);

        let response = RetryPolicy::from_config(http)
            .send(authorized(client.get(&url), &config.api_key))
            .await
            .map_err(|e| {
                PortfolioChatError::VectorStoreError(format!(
                    "Failed to describe index '{}': {e}",
                    config.index_name
                ))
            })?;

        let description: IndexDescription = response.json().await.map_err(|e| {
            PortfolioChatError::VectorStoreError(format!("Failed to parse index description: {e}"))
        })?;

        info!(
            "Resolved index '{}' to host {}",
            config.index_name, description.host
        );

        Self::new(&description.host, &config.api_key, http)
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        Self::connect(&config.vector_store, &config.http).await
    }

    /// Data-plane base URL
    pub fn host(&self) -> &str {
        &self.host
    }

    async fn post<T, R>(&self, path: &str, body: &T) -> Result<R>
    where
        T: Serialize + Sync + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.host, path);
        debug!("Calling Pinecone API: {}", url);

        let response = self
            .retry
            .send(authorized(self.client.post(&url), &self.api_key).json(body))
            .await
            .map_err(|e| PortfolioChatError::VectorStoreError(format!("Pinecone API error: {e}")))?;

        response.json().await.map_err(|e| {
            PortfolioChatError::VectorStoreError(format!("Failed to parse response: {e}"))
        })
    }
}

#[async_trait]
impl VectorStore for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };

        let response: QueryResponse = self.post("/query", &request).await?;
        Ok(response.matches)
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
        let response: UpsertResponse = self
            .post("/vectors/upsert", &UpsertRequest { vectors: records })
            .await?;
        Ok(response.upserted_count)
    }

    async fn dimension(&self) -> Result<usize> {
        let stats: IndexStats = self
            .post("/describe_index_stats", &serde_json::json!({}))
            .await?;
        Ok(stats.dimension)
    }
}

fn authorized(request: RequestBuilder, api_key: &str) -> RequestBuilder {
    request
        .header("Api-Key", api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
}

/// The control plane reports bare hostnames; tests and proxies pass full URLs
pub(crate) fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("portfolio-chat-abc123.svc.pinecone.io"),
            "https://portfolio-chat-abc123.svc.pinecone.io"
        );
        assert_eq!(normalize_host("http://127.0.0.1:5080/"), "http://127.0.0.1:5080");
    }

    #[test]
    fn test_query_wire_format() {
        let vector = [0.5f32, -0.25];
        let request = QueryRequest {
            vector: &vector,
            top_k: 10,
            include_metadata: true,
            include_values: false,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "vector": [0.5, -0.25],
                "topK": 10,
                "includeMetadata": true,
                "includeValues": false
            })
        );
    }
}
