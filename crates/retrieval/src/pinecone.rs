//! Pinecone REST client (data plane query, control plane host lookup).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, trace};

use crate::{Result, RetrievalError, RetrievedChunk, VectorIndex};

pub const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2024-07";

pub struct PineconeIndex {
    client: Client,
    api_key: String,
    host: String,
}

impl PineconeIndex {
    /// Connect to an index by its data-plane host (scheme optional).
    pub fn new(api_key: impl Into<String>, host: &str) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.into(),
            host: normalize_host(host),
        }
    }

    /// Look the index host up by name through the control plane.
    pub async fn resolve(
        api_key: impl Into<String>,
        index_name: &str,
        control_plane: Option<&str>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RetrievalError::NotConfigured);
        }

        let base = control_plane.unwrap_or(CONTROL_PLANE_URL).trim_end_matches('/');
        let url = format!("{}/indexes/{}", base, index_name);
        trace!("GET {}", url);

        let client = http_client();
        let response = client
            .get(&url)
            .header("Api-Key", &api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Api(format!(
                "describe index '{}' returned {}",
                index_name, status
            )));
        }

        let json: serde_json::Value = response.json().await?;
        let host = json["host"]
            .as_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RetrievalError::InvalidResponse("index description has no host".into()))?;

        debug!("resolved index '{}' to {}", index_name, host);
        Ok(Self {
            client,
            api_key,
            host: normalize_host(host),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let url = format!("{}/query", self.host);
        trace!("POST {}", url);

        let body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Api(format!(
                "query returned {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response.json().await?;
        parse_matches(&json)
    }
}

fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap_or_default()
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn parse_matches(json: &serde_json::Value) -> Result<Vec<RetrievedChunk>> {
    let matches = json["matches"]
        .as_array()
        .ok_or_else(|| RetrievalError::InvalidResponse("missing matches".into()))?;

    Ok(matches
        .iter()
        .map(|m| {
            let metadata = &m["metadata"];
            let field = |key: &str| metadata[key].as_str().unwrap_or("").to_string();
            RetrievedChunk {
                id: m["id"].as_str().unwrap_or("").to_string(),
                score: m["score"].as_f64().unwrap_or(0.0) as f32,
                text: field("text"),
                title: field("title"),
                source: field("source"),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("kb-abc.svc.pinecone.io"),
            "https://kb-abc.svc.pinecone.io"
        );
        assert_eq!(normalize_host("http://127.0.0.1:5080/"), "http://127.0.0.1:5080");
    }

    #[test]
    fn test_parse_matches_defaults_missing_metadata() {
        let chunks = parse_matches(&json!({
            "matches": [
                {"id": "a", "score": 0.91, "metadata": {"text": "Towels provided", "title": "Amenities", "source": "guide.pdf"}},
                {"id": "b", "score": 0.42}
            ]
        }))
        .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].title, "Amenities");
        assert_eq!(chunks[0].source, "guide.pdf");
        assert_eq!(chunks[1].text, "");
        assert_eq!(chunks[1].title, "");
    }

    #[test]
    fn test_parse_matches_requires_array() {
        let result = parse_matches(&json!({"namespace": ""}));
        assert!(matches!(result, Err(RetrievalError::InvalidResponse(_))));
    }
}
