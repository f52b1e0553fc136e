//! Durable flow checkpoints.
//!
//! A flow saves its serialized state machine position before every
//! suspension so that, after a process restart, it resumes from the last
//! completed step instead of starting over.

use {dashmap::DashMap, model::LinearId};

#[async_trait::async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, flow_id: LinearId, checkpoint: serde_json::Value);
    async fn load(&self, flow_id: LinearId) -> Option<serde_json::Value>;
    /// Called once the flow completes; a finished flow must not resume.
    async fn clear(&self, flow_id: LinearId);
}

#[derive(Default)]
pub struct InMemoryCheckpoints {
    checkpoints: DashMap<LinearId, serde_json::Value>,
}

impl InMemoryCheckpoints {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CheckpointStore for InMemoryCheckpoints {
    async fn save(&self, flow_id: LinearId, checkpoint: serde_json::Value) {
        self.checkpoints.insert(flow_id, checkpoint);
    }

    async fn load(&self, flow_id: LinearId) -> Option<serde_json::Value> {
        self.checkpoints.get(&flow_id).map(|entry| entry.clone())
    }

    async fn clear(&self, flow_id: LinearId) {
        self.checkpoints.remove(&flow_id);
    }
}
