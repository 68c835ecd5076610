pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A stored movie: whatever fields the client sent, plus the generated `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Abstraction over movie persistence backends.
/// Implementations: PgStore (JSONB rows in PG), MemoryStore (in-process).
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// All records in insertion order.
    async fn list(&self) -> anyhow::Result<Vec<MovieRecord>>;

    /// Persist `fields` under a freshly generated id.
    async fn create(&self, fields: Map<String, Value>) -> anyhow::Result<MovieRecord>;

    /// Returns false when nothing had that id; that is not an error.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}
