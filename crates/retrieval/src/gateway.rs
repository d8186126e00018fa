//! Retrieval gateway: query in, bounded context text out.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::{Embedder, Result, RetrievalError, RetrievedChunk, VectorIndex};

/// Prefix placed before the retrieved chunks.
pub const CONTEXT_HEADER: &str = "### Relevant Business Information:\n";

pub struct RetrievalGateway {
    backend: Option<(Arc<dyn Embedder>, Arc<dyn VectorIndex>)>,
    top_k: usize,
}

impl RetrievalGateway {
    pub const DEFAULT_TOP_K: usize = 3;
    pub const DEFAULT_MAX_LENGTH: usize = 2000;

    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            backend: Some((embedder, index)),
            top_k: Self::DEFAULT_TOP_K,
        }
    }

    /// A gateway with no backing store; always yields empty context.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            top_k: Self::DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Top-`top_k` chunks for `query`, highest score first.
    ///
    /// An empty embedding counts as "no candidates" rather than an error.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let (embedder, index) = self.backend.as_ref().ok_or(RetrievalError::NotConfigured)?;

        let vector = embedder.embed(query).await?;
        if vector.is_empty() {
            return Ok(Vec::new());
        }

        let mut chunks = index.query(&vector, top_k).await?;
        chunks.sort_by(|a, b| b.score.total_cmp(&a.score));
        chunks.truncate(top_k);
        Ok(chunks)
    }

    /// Context block for `query`, or an empty string.
    ///
    /// Never fails: an unconfigured or unreachable store, an embedding
    /// failure and zero candidates all produce `""`.
    pub async fn get_context(&self, query: &str, max_length: usize) -> String {
        if !self.is_available() {
            debug!("retrieval unavailable, skipping context");
            return String::new();
        }

        match self.search(query, self.top_k).await {
            Ok(chunks) => {
                debug!(candidates = chunks.len(), "retrieval candidates");
                render_context(&chunks, max_length)
            }
            Err(e) => {
                warn!("retrieval degraded to empty context: {}", e);
                String::new()
            }
        }
    }
}

/// Greedily pack whole chunk renderings under `max_length` characters.
///
/// Stops at the first chunk that would overflow the budget; chunks already
/// taken are kept. Only the renderings count toward the budget, not the
/// header or the blank lines between chunks.
pub fn render_context(chunks: &[RetrievedChunk], max_length: usize) -> String {
    let mut parts = Vec::new();
    let mut total = 0usize;

    for chunk in chunks {
        let rendered = chunk.render();
        let len = rendered.chars().count();
        if total + len > max_length {
            break;
        }
        total += len;
        parts.push(rendered);
    }

    if parts.is_empty() {
        return String::new();
    }

    format!("{}{}", CONTEXT_HEADER, parts.join("\n\n"))
}
