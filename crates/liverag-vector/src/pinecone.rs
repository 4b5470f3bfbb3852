//! Pinecone vector search over HTTP (`POST {host}/query`).
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use liverag_core::traits::{DenseSearch, Embedder};
use liverag_core::types::{MatchMetadata, SearchMatch};

use crate::search::embed_query;

pub struct PineconeClient {
    client: Client,
    host: String,
    namespace: String,
    api_key: Option<String>,
    embedder: Arc<dyn Embedder>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    namespace: &'a str,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct Match {
    id: Option<String>,
    score: Option<f32>,
    #[serde(default)]
    metadata: Option<MatchMeta>,
}

#[derive(Debug, Default, Deserialize)]
struct MatchMeta {
    text: Option<String>,
    doc_id: Option<String>,
}

impl PineconeClient {
    pub fn new(host: &str, namespace: &str, api_key: Option<String>, timeout_secs: u64, embedder: Box<dyn Embedder>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        let host = host.trim_end_matches('/');
        let host = if host.starts_with("http://") || host.starts_with("https://") { host.to_string() } else { format!("https://{host}") };
        Ok(Self { client, host, namespace: namespace.to_string(), api_key, embedder: Arc::from(embedder) })
    }

    /// Convert a raw `/query` response body into matches, preserving order.
    pub fn parse_response(body: serde_json::Value) -> Result<Vec<SearchMatch>> {
        let parsed: QueryResponse = serde_json::from_value(body).context("unexpected Pinecone response shape")?;
        Ok(parsed
            .matches
            .into_iter()
            .map(|m| {
                let meta = m.metadata.unwrap_or_default();
                SearchMatch {
                    id: m.id,
                    score: m.score.unwrap_or(0.0),
                    metadata: MatchMetadata { text: meta.text, document_id: meta.doc_id },
                }
            })
            .collect())
    }
}

#[async_trait]
impl DenseSearch for PineconeClient {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchMatch>> {
        let vector = embed_query(&self.embedder, query).await?;
        let body = QueryRequest {
            vector: &vector,
            top_k,
            namespace: &self.namespace,
            include_metadata: true,
            include_values: false,
        };
        let url = format!("{}/query", self.host);
        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Api-Key", key);
        }
        let response = request.send().await.with_context(|| format!("Pinecone request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Pinecone returned {status}: {text}"));
        }
        let body: serde_json::Value = response.json().await.context("Pinecone response is not JSON")?;
        Self::parse_response(body)
    }
}
