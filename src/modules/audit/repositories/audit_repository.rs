use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::core::Result;
use crate::modules::audit::models::AuditEntry;

/// Append-only audit trail writes, always inside the caller's transaction so
/// the trail commits or rolls back with the action it records.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_with_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        entry: &AuditEntry,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (
                id, store_id, entity_type, entity_id, action,
                old_value, new_value, actor_id, origin, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.store_id)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.action)
        .bind(entry.old_value.as_ref().map(|v| v.to_string()))
        .bind(entry.new_value.as_ref().map(|v| v.to_string()))
        .bind(&entry.actor_id)
        .bind(&entry.origin)
        .bind(entry.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Entries for one entity, oldest first.
    pub async fn list_for_entity(
        &self,
        store_id: &str,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditEntry>> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            r#"
            SELECT id, store_id, entity_type, entity_id, action,
                   old_value, new_value, actor_id, origin, created_at
            FROM audit_log
            WHERE store_id = ? AND entity_type = ? AND entity_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(store_id)
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuditRow::into_entry).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: String,
    store_id: String,
    entity_type: String,
    entity_id: String,
    action: String,
    old_value: Option<String>,
    new_value: Option<String>,
    actor_id: String,
    origin: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl AuditRow {
    fn into_entry(self) -> Result<AuditEntry> {
        use crate::core::AppError;

        let parse = |value: Option<String>| -> Result<Option<serde_json::Value>> {
            value
                .map(|v| {
                    serde_json::from_str(&v).map_err(|e| {
                        AppError::internal(format!("Invalid audit snapshot JSON: {}", e))
                    })
                })
                .transpose()
        };

        Ok(AuditEntry {
            old_value: parse(self.old_value)?,
            new_value: parse(self.new_value)?,
            id: self.id,
            store_id: self.store_id,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            action: self.action,
            actor_id: self.actor_id,
            origin: self.origin,
            created_at: self.created_at,
        })
    }
}
