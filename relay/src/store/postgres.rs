use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{MovieRecord, MovieStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct MovieRow {
    id: Uuid,
    doc: Json<Map<String, Value>>,
}

impl From<MovieRow> for MovieRecord {
    fn from(row: MovieRow) -> Self {
        MovieRecord {
            id: row.id,
            fields: row.doc.0,
        }
    }
}

#[async_trait]
impl MovieStore for PgStore {
    async fn list(&self) -> anyhow::Result<Vec<MovieRecord>> {
        let rows = sqlx::query_as::<_, MovieRow>(
            "SELECT id, doc FROM movies ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MovieRecord::from).collect())
    }

    async fn create(&self, fields: Map<String, Value>) -> anyhow::Result<MovieRecord> {
        let row = sqlx::query_as::<_, MovieRow>(
            "INSERT INTO movies (doc) VALUES ($1) RETURNING id, doc",
        )
        .bind(Json(&fields))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
