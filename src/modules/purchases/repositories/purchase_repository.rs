use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};

use crate::core::money::parse_db_money;
use crate::core::Result;
use crate::modules::purchases::models::Purchase;

#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts a purchase within the caller's transaction.
    pub async fn create_with_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        purchase: &Purchase,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, store_id, supplier, invoice_number, purchase_date,
                gross_amount, vat_amount, net_amount, tax_period_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.store_id)
        .bind(&purchase.supplier)
        .bind(&purchase.invoice_number)
        .bind(purchase.purchase_date)
        .bind(purchase.gross_amount.to_string())
        .bind(purchase.vat_amount.to_string())
        .bind(purchase.net_amount.to_string())
        .bind(&purchase.tax_period_id)
        .bind(purchase.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Paginated store-scoped listing, optionally narrowed to one period.
    pub async fn list(
        &self,
        store_id: &str,
        tax_period_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Purchase>> {
        let mut builder = QueryBuilder::new(
            "SELECT id, store_id, supplier, invoice_number, purchase_date, \
             gross_amount, vat_amount, net_amount, tax_period_id, created_at \
             FROM purchases WHERE store_id = ",
        );
        builder.push_bind(store_id);

        if let Some(period_id) = tax_period_id {
            builder.push(" AND tax_period_id = ");
            builder.push_bind(period_id);
        }

        builder.push(" ORDER BY purchase_date DESC, created_at DESC LIMIT ");
        builder.push_bind(limit.clamp(1, 100));
        builder.push(" OFFSET ");
        builder.push_bind(offset.max(0));

        let rows: Vec<PurchaseRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter().map(PurchaseRow::into_purchase).collect()
    }

    /// Every purchase linked to a period, for closure and reporting.
    pub async fn list_by_period(
        &self,
        store_id: &str,
        tax_period_id: &str,
    ) -> Result<Vec<Purchase>> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, store_id, supplier, invoice_number, purchase_date,
                   gross_amount, vat_amount, net_amount, tax_period_id,
                   created_at
            FROM purchases
            WHERE store_id = ? AND tax_period_id = ?
            ORDER BY purchase_date, created_at
            "#,
        )
        .bind(store_id)
        .bind(tax_period_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PurchaseRow::into_purchase).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: String,
    store_id: String,
    supplier: String,
    invoice_number: String,
    purchase_date: NaiveDate,
    gross_amount: String,
    vat_amount: String,
    net_amount: String,
    tax_period_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl PurchaseRow {
    fn into_purchase(self) -> Result<Purchase> {
        Ok(Purchase {
            gross_amount: parse_db_money(&self.gross_amount, "gross_amount")?,
            vat_amount: parse_db_money(&self.vat_amount, "vat_amount")?,
            net_amount: parse_db_money(&self.net_amount, "net_amount")?,
            id: self.id,
            store_id: self.store_id,
            supplier: self.supplier,
            invoice_number: self.invoice_number,
            purchase_date: self.purchase_date,
            tax_period_id: self.tax_period_id,
            created_at: self.created_at,
        })
    }
}
