use std::sync::Mutex as StdMutex;

use serde_json::json;
use tokio::sync::Semaphore;

use super::*;
use crate::connection::create_connection;
use crate::doc::NodePatch;

// =========================================================================
// Mock services
// =========================================================================

struct MockService {
    results: StdMutex<Vec<Result<Map<String, Value>, GenerationError>>>,
    seen: StdMutex<Vec<GenerationRequest>>,
}

impl MockService {
    fn new(results: Vec<Result<Map<String, Value>, GenerationError>>) -> Self {
        Self { results: StdMutex::new(results), seen: StdMutex::new(Vec::new()) }
    }
}

#[async_trait::async_trait]
impl GenerationService for MockService {
    async fn generate(&self, request: &GenerationRequest) -> Result<Map<String, Value>, GenerationError> {
        self.seen.lock().unwrap().push(request.clone());
        let mut results = self.results.lock().unwrap();
        if results.is_empty() { Ok(Map::new()) } else { results.remove(0) }
    }
}

/// Blocks until a permit is released, then returns one media URL.
struct GatedService {
    gate: Semaphore,
}

impl GatedService {
    fn new() -> Self {
        Self { gate: Semaphore::new(0) }
    }
}

#[async_trait::async_trait]
impl GenerationService for GatedService {
    async fn generate(&self, request: &GenerationRequest) -> Result<Map<String, Value>, GenerationError> {
        let permit = self.gate.acquire().await.map_err(|e| GenerationError::Failed(e.to_string()))?;
        permit.forget();
        Ok(media(&format!("https://cdn.test/{}.png", request.node_id)))
    }
}

struct SlowService;

#[async_trait::async_trait]
impl GenerationService for SlowService {
    async fn generate(&self, _request: &GenerationRequest) -> Result<Map<String, Value>, GenerationError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Map::new())
    }
}

fn media(url: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("mediaUrls".into(), json!([url]));
    fields
}

fn shared_with(kinds: &[NodeKind]) -> (SharedEngine, Vec<NodeId>) {
    let mut engine = Engine::default();
    let ids = kinds.iter().map(|k| engine.add_node(*k, None).id).collect();
    (Arc::new(Mutex::new(engine)), ids)
}

const TIMEOUT: Duration = Duration::from_secs(2);

// =========================================================================
// Requests
// =========================================================================

#[test]
fn only_media_kinds_generate() {
    assert!(generates(NodeKind::TextToImage));
    assert!(generates(NodeKind::TextToVideo));
    assert!(!generates(NodeKind::CreativeDesc));
    assert!(!generates(NodeKind::Image));
    assert!(!generates(NodeKind::Group));
}

#[test]
fn request_collects_prompt_and_upstream_inputs() {
    let mut engine = Engine::default();
    let desc = engine.add_node(NodeKind::CreativeDesc, None).id;
    let image = engine.add_node(NodeKind::Image, None).id;
    let target = engine.add_node(NodeKind::TextToVideo, None).id;
    let mut prompt = Map::new();
    prompt.insert("prompt".into(), json!("slow pan"));
    engine.update_node(&target, NodePatch { payload: Some(prompt), ..Default::default() });
    let mut desc_text = Map::new();
    desc_text.insert("prompt".into(), json!("foggy harbour"));
    engine.update_node(&desc, NodePatch { payload: Some(desc_text), ..Default::default() });
    engine.update_node(&image, NodePatch { payload: Some(media("https://cdn.test/ref.png")), ..Default::default() });
    create_connection(&mut engine.store, &desc, &target).unwrap();
    create_connection(&mut engine.store, &image, &target).unwrap();

    let (request, actions) = engine.request_generation(&target).unwrap();
    assert_eq!(request.prompt, "slow pan");
    assert_eq!(request.inputs.len(), 2);
    assert_eq!(request.inputs[0].prompt, "foggy harbour");
    assert_eq!(request.inputs[1].media_urls, vec!["https://cdn.test/ref.png".to_owned()]);
    assert!(engine.node(&target).unwrap().is_loading);
    assert!(actions.iter().any(|a| matches!(
        a,
        Action::NodeUpdated { id, fields } if id == &target && fields.is_loading == Some(true)
    )));
}

#[test]
fn request_refused_while_in_flight_or_for_wrong_kind() {
    let mut engine = Engine::default();
    let gen_node = engine.add_node(NodeKind::TextToImage, None).id;
    let media_node = engine.add_node(NodeKind::Image, None).id;
    assert!(engine.request_generation(&gen_node).is_some());
    assert!(engine.request_generation(&gen_node).is_none());
    assert!(engine.request_generation(&media_node).is_none());
    assert!(engine.request_generation(&NodeId::from("ghost")).is_none());
}

// =========================================================================
// run_generation
// =========================================================================

#[tokio::test]
async fn success_merges_result_and_clears_loading() {
    let (engine, ids) = shared_with(&[NodeKind::TextToImage]);
    let service = MockService::new(vec![Ok(media("https://cdn.test/out.png"))]);
    let actions = run_generation(&engine, &service, &ids[0], TIMEOUT).await.unwrap();
    let loading: Vec<Option<bool>> = actions
        .iter()
        .filter_map(|a| match a {
            Action::NodeUpdated { fields, .. } => Some(fields.is_loading),
            _ => None,
        })
        .collect();
    assert_eq!(loading, vec![Some(true), Some(false)]);

    let engine = engine.lock().await;
    let node = engine.node(&ids[0]).unwrap();
    assert!(!node.is_loading);
    assert_eq!(node.props().media_urls(), vec!["https://cdn.test/out.png"]);
    assert_eq!(service.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failure_clears_loading() {
    let (engine, ids) = shared_with(&[NodeKind::TextToImage]);
    let service = MockService::new(vec![Err(GenerationError::Failed("quota".into()))]);
    let err = run_generation(&engine, &service, &ids[0], TIMEOUT).await.unwrap_err();
    assert!(matches!(err, GenerationError::Failed(ref m) if m == "quota"));
    assert!(!engine.lock().await.node(&ids[0]).unwrap().is_loading);
}

#[tokio::test]
async fn timeout_clears_loading() {
    let (engine, ids) = shared_with(&[NodeKind::TextToVideo]);
    let err = run_generation(&engine, &SlowService, &ids[0], Duration::from_millis(20)).await.unwrap_err();
    assert!(matches!(err, GenerationError::TimedOut(_)));
    assert!(!engine.lock().await.node(&ids[0]).unwrap().is_loading);
}

#[tokio::test]
async fn not_ready_node_never_reaches_service() {
    let (engine, ids) = shared_with(&[NodeKind::Image]);
    let service = MockService::new(vec![]);
    let err = run_generation(&engine, &service, &ids[0], TIMEOUT).await.unwrap_err();
    assert!(matches!(err, GenerationError::NotReady(_)));
    assert!(service.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn late_result_for_deleted_node_is_dropped() {
    let (engine, ids) = shared_with(&[NodeKind::TextToImage]);
    let service = Arc::new(GatedService::new());
    let handle = spawn_generation(engine.clone(), service.clone(), ids[0].clone(), TIMEOUT);

    // Wait until the request has started.
    loop {
        if engine.lock().await.node(&ids[0]).is_some_and(|n| n.is_loading) {
            break;
        }
        tokio::task::yield_now().await;
    }
    engine.lock().await.delete_node(&ids[0]);
    service.gate.add_permits(1);

    let actions = handle.await.unwrap().unwrap();
    assert!(!actions.iter().any(|a| matches!(
        a,
        Action::NodeUpdated { fields, .. } if fields.is_loading == Some(false)
    )));
    let engine = engine.lock().await;
    assert!(engine.node(&ids[0]).is_none());
    assert!(engine.store.is_empty());
}

#[tokio::test]
async fn concurrent_requests_touch_only_their_nodes() {
    let (engine, ids) = shared_with(&[NodeKind::TextToImage, NodeKind::TextToVideo]);
    let gated = Arc::new(GatedService::new());
    let first = spawn_generation(engine.clone(), gated.clone(), ids[0].clone(), TIMEOUT);
    let second = spawn_generation(engine.clone(), gated.clone(), ids[1].clone(), TIMEOUT);

    loop {
        let both_loading = {
            let e = engine.lock().await;
            ids.iter().all(|id| e.node(id).is_some_and(|n| n.is_loading))
        };
        if both_loading {
            break;
        }
        tokio::task::yield_now().await;
    }
    gated.gate.add_permits(2);
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let engine = engine.lock().await;
    for id in &ids {
        let node = engine.node(id).unwrap();
        assert!(!node.is_loading);
        assert_eq!(node.props().media_urls(), vec![format!("https://cdn.test/{id}.png")]);
    }
}

#[tokio::test]
async fn configured_timeout_applies() {
    let mut engine = Engine::new(crate::config::EditorConfig { generation_timeout_secs: 0, ..Default::default() });
    let id = engine.add_node(NodeKind::TextToImage, None).id;
    let engine: SharedEngine = Arc::new(Mutex::new(engine));
    let handle = spawn_with_config(engine.clone(), Arc::new(SlowService), id.clone()).await;
    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, GenerationError::TimedOut(d) if d == Duration::ZERO));
    assert!(!engine.lock().await.node(&id).unwrap().is_loading);
}
