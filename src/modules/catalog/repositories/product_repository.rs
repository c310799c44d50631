// Inventory ledger access for the settlement path.
//
// Two operations only: read current stock/price for a set of products, and
// a conditional decrement that refuses to take stock below zero. Everything
// else about products belongs to the catalog collaborator.

use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::core::money::parse_db_money;
use crate::core::Result;
use crate::modules::catalog::models::Product;

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Loads the active products matching `ids` within the caller's store.
    ///
    /// Returns only what exists; callers compare the result count against the
    /// distinct id count to detect missing/inactive/cross-store products.
    pub async fn find_active_by_ids(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        store_id: &str,
        ids: &[String],
    ) -> Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::new(
            "SELECT id, store_id, name, selling_price, cost_price, stock_quantity, \
             is_active, created_at, updated_at \
             FROM products WHERE store_id = ",
        );
        builder.push_bind(store_id);
        builder.push(" AND is_active = 1 AND id IN (");

        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows: Vec<ProductRow> = builder
            .build_query_as()
            .fetch_all(&mut **tx)
            .await?;

        rows.into_iter().map(ProductRow::into_product).collect()
    }

    /// Atomically takes `quantity` units of stock, refusing to go below zero.
    ///
    /// The `stock_quantity >= ?` guard makes check and decrement one write:
    /// two settlements racing over the same product cannot both pass. Returns
    /// false when the guard rejected the decrement (stock moved since the
    /// caller's snapshot check).
    pub async fn decrement_stock(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        store_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> Result<bool> {
        let now = chrono::Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - ?, updated_at = ?
            WHERE id = ? AND store_id = ? AND stock_quantity >= ?
            "#,
        )
        .bind(quantity)
        .bind(now)
        .bind(product_id)
        .bind(store_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;

        let decremented = result.rows_affected() > 0;
        debug!(product_id, quantity, decremented, "Stock decrement");

        Ok(decremented)
    }

    /// Current stock level, read under the caller's transaction.
    ///
    /// Used to report accurate availability when a guarded decrement is
    /// rejected mid-settlement.
    pub async fn stock_quantity(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        store_id: &str,
        product_id: &str,
    ) -> Result<Option<i64>> {
        let stock: Option<i64> = sqlx::query_scalar(
            "SELECT stock_quantity FROM products WHERE id = ? AND store_id = ?",
        )
        .bind(product_id)
        .bind(store_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(stock)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    store_id: String,
    name: String,
    selling_price: String,
    cost_price: String,
    stock_quantity: i64,
    is_active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl ProductRow {
    fn into_product(self) -> Result<Product> {
        Ok(Product {
            selling_price: parse_db_money(&self.selling_price, "selling_price")?,
            cost_price: parse_db_money(&self.cost_price, "cost_price")?,
            id: self.id,
            store_id: self.store_id,
            name: self.name,
            stock_quantity: self.stock_quantity,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
