//! OpenAI embeddings client.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, trace};

use crate::{Embedder, Result, RetrievalError};

/// Calls `POST {api_base}/embeddings` for a single input.
///
/// The `dimensions` parameter lets `text-embedding-3-*` models produce
/// vectors sized to match the index.
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        let api_base = api_base
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.into(),
            dimensions,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.api_key.is_empty() {
            return Err(RetrievalError::NotConfigured);
        }

        let url = format!("{}/embeddings", self.api_base);
        trace!("POST {}", url);

        let body = json!({
            "model": self.model,
            "input": text,
            "dimensions": self.dimensions,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Api(format!(
                "embeddings returned {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response.json().await?;
        let vector = parse_embedding(&json)?;
        debug!(dims = vector.len(), "query embedded");
        Ok(vector)
    }
}

/// Extract `data[0].embedding` from an embeddings response.
fn parse_embedding(json: &serde_json::Value) -> Result<Vec<f32>> {
    let embedding = json
        .get("data")
        .and_then(|d| d.get(0))
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| RetrievalError::InvalidResponse("missing data[0].embedding".into()))?;

    Ok(embedding
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect())
}
