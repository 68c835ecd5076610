use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MovieRecord, MovieStore};

/// Process-local store backing `serve --ephemeral` and the test suite.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<MovieRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn list(&self) -> anyhow::Result<Vec<MovieRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn create(&self, fields: Map<String, Value>) -> anyhow::Result<MovieRecord> {
        let record = MovieRecord {
            id: Uuid::new_v4(),
            fields,
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}
