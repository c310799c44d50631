use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::core::money::parse_db_money;
use crate::core::Result;
use crate::modules::taxes::models::{TaxRecord, TransactionType};

/// Append-only access to the tax ledger. There is deliberately no update or
/// delete here.
#[derive(Debug, Clone)]
pub struct TaxRecordRepository {
    pool: SqlitePool,
}

impl TaxRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends a ledger row within the caller's transaction.
    pub async fn create_with_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        record: &TaxRecord,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tax_records (
                id, store_id, source_id, transaction_type, taxable_amount,
                vat_rate, vat_amount, total_amount, payment_method,
                period_tag, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.store_id)
        .bind(&record.source_id)
        .bind(record.transaction_type.to_string())
        .bind(record.taxable_amount.to_string())
        .bind(record.vat_rate.to_string())
        .bind(record.vat_amount.to_string())
        .bind(record.total_amount.to_string())
        .bind(&record.payment_method)
        .bind(&record.period_tag)
        .bind(record.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Ledger rows for a store, optionally narrowed to one accrual month.
    pub async fn list(
        &self,
        store_id: &str,
        period_tag: Option<&str>,
    ) -> Result<Vec<TaxRecord>> {
        let rows: Vec<TaxRecordRow> = match period_tag {
            Some(tag) => {
                sqlx::query_as(
                    r#"
                    SELECT id, store_id, source_id, transaction_type,
                           taxable_amount, vat_rate, vat_amount, total_amount,
                           payment_method, period_tag, created_at
                    FROM tax_records
                    WHERE store_id = ? AND period_tag = ?
                    ORDER BY created_at
                    "#,
                )
                .bind(store_id)
                .bind(tag)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT id, store_id, source_id, transaction_type,
                           taxable_amount, vat_rate, vat_amount, total_amount,
                           payment_method, period_tag, created_at
                    FROM tax_records
                    WHERE store_id = ?
                    ORDER BY created_at
                    "#,
                )
                .bind(store_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(TaxRecordRow::into_record).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TaxRecordRow {
    id: String,
    store_id: String,
    source_id: String,
    transaction_type: String,
    taxable_amount: String,
    vat_rate: String,
    vat_amount: String,
    total_amount: String,
    payment_method: Option<String>,
    period_tag: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TaxRecordRow {
    fn into_record(self) -> Result<TaxRecord> {
        use crate::core::AppError;
        use std::str::FromStr;

        let transaction_type =
            TransactionType::from_str(&self.transaction_type).map_err(AppError::Internal)?;

        Ok(TaxRecord {
            taxable_amount: parse_db_money(&self.taxable_amount, "taxable_amount")?,
            vat_rate: parse_db_money(&self.vat_rate, "vat_rate")?,
            vat_amount: parse_db_money(&self.vat_amount, "vat_amount")?,
            total_amount: parse_db_money(&self.total_amount, "total_amount")?,
            transaction_type,
            id: self.id,
            store_id: self.store_id,
            source_id: self.source_id,
            payment_method: self.payment_method,
            period_tag: self.period_tag,
            created_at: self.created_at,
        })
    }
}
