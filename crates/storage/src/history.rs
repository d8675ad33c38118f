use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// One completed analysis. Rows are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeHistory {
    pub id: i64,
    pub image_uri: String,
    pub analyze_result: String,
    pub nutrition: String,
    pub confidence_score: f32,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewHistory {
    pub image_uri: String,
    pub analyze_result: String,
    pub nutrition: String,
    pub confidence_score: f32,
}

#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends a record and returns its id.
    pub async fn insert(&self, record: &NewHistory) -> anyhow::Result<i64> {
        let id = sqlx::query(
            "INSERT INTO analyze_history (image_uri, analyze_result, nutrition, confidence_score) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&record.image_uri)
        .bind(&record.analyze_result)
        .bind(&record.nutrition)
        .bind(record.confidence_score)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        debug!(id, result = %record.analyze_result, "history row inserted");
        Ok(id)
    }

    /// Full table in insertion order.
    pub async fn all(&self) -> anyhow::Result<Vec<AnalyzeHistory>> {
        let rows = sqlx::query(
            "SELECT id, image_uri, analyze_result, nutrition, confidence_score, created_at FROM analyze_history ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(AnalyzeHistory {
                id: row.get(0),
                image_uri: row.get(1),
                analyze_result: row.get(2),
                nutrition: row.get(3),
                confidence_score: row.get(4),
                created_at: row.get(5),
            });
        }
        Ok(out)
    }

    pub async fn count(&self) -> anyhow::Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analyze_history")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect, migrate};

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let pool = connect("sqlite::memory:").await.unwrap();
        migrate(&pool).await.unwrap();
        let store = HistoryStore::new(pool);
        let rec = NewHistory {
            image_uri: "file:///tmp/a.jpg".into(),
            analyze_result: "Rendang".into(),
            nutrition: "193".into(),
            confidence_score: 87.0,
        };
        let a = store.insert(&rec).await.unwrap();
        let b = store.insert(&rec).await.unwrap();
        assert!(b > a);
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
