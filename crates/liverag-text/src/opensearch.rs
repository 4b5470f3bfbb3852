//! OpenSearch keyword search over HTTP (`POST /{index}/_search`).
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use liverag_core::traits::SparseSearch;
use liverag_core::types::{MatchMetadata, SearchMatch};

pub struct OpenSearchClient {
    client: Client,
    base_url: String,
    index: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source", default)]
    source: HitSource,
}

#[derive(Debug, Default, Deserialize)]
struct HitSource {
    text: Option<String>,
    doc_id: Option<String>,
}

impl OpenSearchClient {
    pub fn new(base_url: &str, index: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
        })
    }

    fn request_body(query: &str, top_k: usize) -> serde_json::Value {
        json!({
            "query": { "match": { "text": query } },
            "size": top_k,
        })
    }

    /// Convert a raw `_search` response body into matches, preserving hit order.
    pub fn parse_response(body: serde_json::Value) -> Result<Vec<SearchMatch>> {
        let parsed: SearchResponse = serde_json::from_value(body).context("unexpected OpenSearch response shape")?;
        Ok(parsed
            .hits
            .hits
            .into_iter()
            .map(|h| SearchMatch {
                id: h.id,
                score: h.score.unwrap_or(0.0),
                metadata: MatchMetadata { text: h.source.text, document_id: h.source.doc_id },
            })
            .collect())
    }
}

#[async_trait]
impl SparseSearch for OpenSearchClient {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchMatch>> {
        let url = format!("{}/{}/_search", self.base_url, self.index);
        let response = self
            .client
            .post(&url)
            .json(&Self::request_body(query, top_k))
            .send()
            .await
            .with_context(|| format!("OpenSearch request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenSearch returned {status}: {text}"));
        }
        let body: serde_json::Value = response.json().await.context("OpenSearch response is not JSON")?;
        Self::parse_response(body)
    }
}
