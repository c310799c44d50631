use sqlx::SqlitePool;

use crate::core::Result;

/// Business identity of a store, for report headers.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct StoreIdentity {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

/// Read-only access to store records (owned by the branding collaborator).
#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, store_id: &str) -> Result<Option<StoreIdentity>> {
        let store: Option<StoreIdentity> = sqlx::query_as(
            "SELECT id, name, address, tax_id FROM stores WHERE id = ?",
        )
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(store)
    }
}
