//! Durable storage for the last-chosen society.
//!
//! One row, no expiration, independent of the credential store. The resolver
//! is responsible for ignoring a stored id that no longer matches the user's
//! memberships; this store only remembers the last choice.

use sqlx::sqlite::SqlitePool;

/// Store for the persisted society choice.
pub struct TenantChoiceStore {
    pool: SqlitePool,
}

impl TenantChoiceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The last persisted society id, if any.
    pub async fn get(&self) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT tenant_id FROM tenant_choice WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|r| r.0))
    }

    /// Remember a society choice, replacing any prior one.
    pub async fn set(&self, tenant_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR REPLACE INTO tenant_choice (id, tenant_id) VALUES (1, ?)")
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Forget the stored choice.
    pub async fn clear(&self) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM tenant_choice")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
