//! Retrieval of background knowledge for prompt augmentation.
//!
//! The [`RetrievalGateway`] turns a user query into a bounded block of
//! context text. It sits on two collaborators:
//!
//! - an [`Embedder`] that maps text to a vector, and
//! - a [`VectorIndex`] that returns the nearest stored chunks.
//!
//! Both are traits so the gateway can run against the OpenAI embeddings
//! endpoint and a Pinecone index in production, and against fakes in tests.
//! Any failure below the gateway degrades to "no context"; callers never see
//! a retrieval error from [`RetrievalGateway::get_context`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod embedding;
pub mod gateway;
pub mod pinecone;

pub use embedding::OpenAiEmbedder;
pub use gateway::{render_context, RetrievalGateway, CONTEXT_HEADER};
pub use pinecone::PineconeIndex;

/// Errors from the embedding and vector-index clients.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("retrieval is not configured")]
    NotConfigured,

    #[error("retrieval request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed retrieval JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("retrieval API error: {0}")]
    Api(String),

    #[error("invalid retrieval response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;

/// A retrieved unit of background text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub title: String,
    pub source: String,
}

impl RetrievedChunk {
    /// `"[title]\ntext"` when a title exists, else the bare text.
    pub fn render(&self) -> String {
        if self.title.is_empty() {
            self.text.clone()
        } else {
            format!("[{}]\n{}", self.title, self.text)
        }
    }
}

/// Text embedding backend.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Nearest-neighbour search over stored chunks.
///
/// Implementations return matches ranked by descending similarity.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>>;
}
