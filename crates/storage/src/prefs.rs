use sqlx::SqlitePool;

/// Key-value settings grouped under a named scope.
#[derive(Clone)]
pub struct Preferences {
    pool: SqlitePool,
    scope: String,
}

impl Preferences {
    pub fn new(pool: SqlitePool, scope: &str) -> Self {
        Self {
            pool,
            scope: scope.to_string(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM preferences WHERE scope = ?1 AND key = ?2")
                .bind(&self.scope)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    pub async fn put(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO preferences (scope, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope, key) DO UPDATE SET
               value = excluded.value,
               updated_at = strftime('%s','now')",
        )
        .bind(&self.scope)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM preferences WHERE scope = ?1 AND key = ?2")
            .bind(&self.scope)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
