//! Shared fixtures for the agent integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use concierge_agent::{BookingStore, Orchestrator, PromptComposer, SystemPrompt, ToolCatalog};
use concierge_provider::{ChatParams, ChatResponse, Provider, ProviderError, ToolCall};
use concierge_retrieval::{Embedder, RetrievalError, RetrievalGateway, RetrievedChunk, VectorIndex};

mock! {
    pub Provider {}

    #[async_trait]
    impl Provider for Provider {
        async fn chat(&self, params: ChatParams) -> Result<ChatResponse, ProviderError>;
        fn default_model(&self) -> String;
        fn is_configured(&self) -> bool;
    }
}

mock! {
    pub Embedder {}

    #[async_trait]
    impl Embedder for Embedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
    }
}

mock! {
    pub Index {}

    #[async_trait]
    impl VectorIndex for Index {
        async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>, RetrievalError>;
    }
}

pub type Captured = Arc<Mutex<Vec<ChatParams>>>;

/// A provider that answers with `responses` in order and records every request.
pub fn scripted(responses: Vec<Result<ChatResponse, ProviderError>>) -> (MockProvider, Captured) {
    let calls = responses.len();
    let queue = Mutex::new(VecDeque::from(responses));
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);

    let mut provider = MockProvider::new();
    provider.expect_chat().times(calls).returning(move |params| {
        sink.lock().unwrap().push(params);
        queue
            .lock()
            .unwrap()
            .pop_front()
            .expect("more model calls than scripted")
    });

    (provider, captured)
}

pub fn tool_call(id: &str, name: &str, arguments: Value) -> ToolCall {
    ToolCall::new(id, name, arguments)
}

pub fn orchestrator(provider: MockProvider, store: BookingStore) -> Orchestrator<MockProvider> {
    Orchestrator::new(
        provider,
        PromptComposer::new(SystemPrompt::Default),
        ToolCatalog::new(store),
        RetrievalGateway::disabled(),
    )
}

pub fn orchestrator_with_retrieval(
    provider: MockProvider,
    store: BookingStore,
    retrieval: RetrievalGateway,
) -> Orchestrator<MockProvider> {
    Orchestrator::new(
        provider,
        PromptComposer::new(SystemPrompt::Default),
        ToolCatalog::new(store),
        retrieval,
    )
}

/// A gateway whose index always returns `chunks`.
pub fn gateway_returning(chunks: Vec<RetrievedChunk>) -> RetrievalGateway {
    let mut embedder = MockEmbedder::new();
    embedder.expect_embed().returning(|_| Ok(vec![0.1, 0.2, 0.3]));

    let mut index = MockIndex::new();
    index
        .expect_query()
        .returning(move |_, _| Ok(chunks.clone()));

    RetrievalGateway::new(Arc::new(embedder), Arc::new(index))
}

pub fn chunk(title: &str, text: &str, score: f32) -> RetrievedChunk {
    RetrievedChunk {
        id: format!("chunk-{}", score),
        score,
        text: text.to_string(),
        title: title.to_string(),
        source: "handbook.pdf".to_string(),
    }
}
