//! Durable storage for the access/refresh token pair.
//!
//! Tokens are opaque strings; this store never parses them. Expiry is a
//! storage concern: each slot carries its own `expires_at` and an expired
//! slot simply reads as absent.

use sqlx::sqlite::SqlitePool;

use crate::backend::TokenPair;

const ACCESS_SLOT: &str = "access";
const REFRESH_SLOT: &str = "refresh";

/// The persisted credential. Either slot may have expired out independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Credential {
    /// A freshly issued pair, both slots live.
    pub fn from_pair(pair: &TokenPair) -> Self {
        Self {
            access_token: Some(pair.access_token.clone()),
            refresh_token: Some(pair.refresh_token.clone()),
        }
    }
}

/// Store for the single live credential pair.
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read whatever slots are still live. `None` when both are gone.
    pub async fn get(&self) -> Result<Option<Credential>, sqlx::Error> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT slot, token FROM credentials WHERE expires_at >= datetime('now')",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut credential = Credential {
            access_token: None,
            refresh_token: None,
        };
        for (slot, token) in rows {
            match slot.as_str() {
                ACCESS_SLOT => credential.access_token = Some(token),
                REFRESH_SLOT => credential.refresh_token = Some(token),
                _ => {}
            }
        }

        if credential.access_token.is_none() && credential.refresh_token.is_none() {
            Ok(None)
        } else {
            Ok(Some(credential))
        }
    }

    /// Persist a freshly issued pair. Last write wins: any prior pair is
    /// replaced as far as this store is concerned.
    pub async fn set(
        &self,
        pair: &TokenPair,
        access_ttl_secs: u64,
        refresh_ttl_secs: u64,
    ) -> Result<(), sqlx::Error> {
        self.set_slot(ACCESS_SLOT, &pair.access_token, access_ttl_secs)
            .await?;
        self.set_slot(REFRESH_SLOT, &pair.refresh_token, refresh_ttl_secs)
            .await?;
        Ok(())
    }

    async fn set_slot(&self, slot: &str, token: &str, ttl_secs: u64) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT OR REPLACE INTO credentials (slot, token, expires_at)
             VALUES (?, ?, datetime('now', ?))",
        )
        .bind(slot)
        .bind(token)
        .bind(format!("+{} seconds", ttl_secs))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Drop both slots.
    pub async fn clear(&self) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM credentials")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete slots that have expired out.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM credentials WHERE expires_at < datetime('now')")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
