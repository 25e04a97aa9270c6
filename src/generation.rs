//! Generation collaborator boundary.
//!
//! The engine only marks a node as loading and later merges a result patch.
//! Producing media is delegated to a [`GenerationService`]. Requests run
//! without holding the engine lock, so several nodes can generate at once;
//! each request touches only its own node on completion. Every request ends
//! with the loading flag cleared, on success, failure, or timeout.

#[cfg(test)]
#[path = "generation_test.rs"]
mod generation_test;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::doc::{GraphStore, Node, NodeId, NodeKind};
use crate::engine::{Action, Engine};

/// Engine shared between the UI thread and generation tasks.
pub type SharedEngine = Arc<Mutex<Engine>>;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("node {0} cannot start a generation")]
    NotReady(NodeId),
    #[error("generation failed: {0}")]
    Failed(String),
    #[error("generation timed out after {0:?}")]
    TimedOut(Duration),
}

/// Whether nodes of `kind` produce media on request.
#[must_use]
pub fn generates(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::TextToImage | NodeKind::TextToVideo)
}

/// An upstream node feeding a generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationInput {
    pub node_id: NodeId,
    pub kind: NodeKind,
    pub prompt: String,
    pub media_urls: Vec<String>,
}

/// Everything a service needs to run one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub node_id: NodeId,
    pub kind: NodeKind,
    pub prompt: String,
    /// The node's full payload, provider settings included.
    pub payload: Map<String, Value>,
    /// Sources wired into this node, in connection order.
    pub inputs: Vec<GenerationInput>,
}

impl GenerationRequest {
    #[must_use]
    pub fn for_node(store: &GraphStore, node: &Node) -> Self {
        let inputs = store
            .connections()
            .iter()
            .filter(|c| c.target_id == node.id)
            .filter_map(|c| store.node(&c.source_id))
            .map(|source| GenerationInput {
                node_id: source.id.clone(),
                kind: source.kind,
                prompt: source.props().prompt().to_owned(),
                media_urls: source.props().media_urls().into_iter().map(str::to_owned).collect(),
            })
            .collect();
        Self {
            node_id: node.id.clone(),
            kind: node.kind,
            prompt: node.props().prompt().to_owned(),
            payload: node.payload.clone(),
            inputs,
        }
    }
}

/// Produces media for a generation request. Enables mocking in tests.
#[async_trait::async_trait]
pub trait GenerationService: Send + Sync {
    /// Run one generation and return the fields to merge into the node
    /// (for example `mediaUrls`).
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`] if the provider fails.
    async fn generate(&self, request: &GenerationRequest) -> Result<Map<String, Value>, GenerationError>;
}

/// Run one generation for `id` to completion.
///
/// # Errors
///
/// Returns [`GenerationError::NotReady`] if the node cannot start a request,
/// otherwise the service's error or [`GenerationError::TimedOut`]. The
/// loading flag is cleared in every case that started a request. On success
/// the actions cover both the loading flag and the merged result.
pub async fn run_generation(
    engine: &SharedEngine,
    service: &dyn GenerationService,
    id: &NodeId,
    timeout: Duration,
) -> Result<Vec<Action>, GenerationError> {
    let request = engine.lock().await.request_generation(id);
    let Some((request, mut actions)) = request else {
        return Err(GenerationError::NotReady(id.clone()));
    };

    let outcome = tokio::time::timeout(timeout, service.generate(&request)).await;
    let mut engine = engine.lock().await;
    match outcome {
        Ok(Ok(fields)) => {
            info!(node_id = %id, fields = fields.len(), "generation finished");
            actions.extend(engine.complete_generation(id, fields));
            Ok(actions)
        }
        Ok(Err(err)) => {
            warn!(node_id = %id, error = %err, "generation failed");
            engine.fail_generation(id);
            Err(err)
        }
        Err(_elapsed) => {
            warn!(node_id = %id, ?timeout, "generation timed out");
            engine.fail_generation(id);
            Err(GenerationError::TimedOut(timeout))
        }
    }
}

/// Fire-and-forget variant of [`run_generation`] on the tokio runtime.
pub fn spawn_generation(
    engine: SharedEngine,
    service: Arc<dyn GenerationService>,
    id: NodeId,
    timeout: Duration,
) -> JoinHandle<Result<Vec<Action>, GenerationError>> {
    tokio::spawn(async move { run_generation(&engine, service.as_ref(), &id, timeout).await })
}

/// [`spawn_generation`] with the engine's configured timeout.
pub async fn spawn_with_config(
    engine: SharedEngine,
    service: Arc<dyn GenerationService>,
    id: NodeId,
) -> JoinHandle<Result<Vec<Action>, GenerationError>> {
    let timeout = engine.lock().await.config.generation_timeout();
    spawn_generation(engine, service, id, timeout)
}
