// Sale persistence.
//
// Settlement writes go through `create_with_tx`/`next_invoice_number` inside
// the caller's transaction; reads serve the list endpoint, period closure and
// the VAT report. Sales are never updated here once written.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::core::money::parse_db_money;
use crate::core::Result;
use crate::modules::sales::models::{Sale, SaleItem, SaleWithItems};

/// Filters for the sale list endpoint. All optional, all store-scoped.
#[derive(Debug, Clone, Default)]
pub struct SaleListFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub cashier_id: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Allocates the next invoice number for a store.
    ///
    /// Backed by a per-store monotonic counter updated inside the settlement
    /// transaction, so numbers are unique and gap over rollbacks only.
    /// Format: `INV-{YYYYMM}-{seq:06}`.
    pub async fn next_invoice_number(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        store_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO invoice_counters (store_id, next_seq) VALUES (?, 2)
            ON CONFLICT (store_id) DO UPDATE SET next_seq = next_seq + 1
            RETURNING next_seq - 1
            "#,
        )
        .bind(store_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(format!("INV-{}-{:06}", now.format("%Y%m"), seq))
    }

    /// Inserts a sale header and all of its items within the caller's
    /// transaction. Nothing is visible to readers until the caller commits.
    pub async fn create_with_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sale: &Sale,
        items: &[SaleItem],
    ) -> Result<()> {
        debug!(sale_id = %sale.id, invoice_number = %sale.invoice_number, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, store_id, cashier_id, customer_id, customer_name,
                delivery_type, delivery_address, delivery_price,
                invoice_number, subtotal, discount_percent, discount_amount,
                tax_amount, total_amount, gross_amount, net_amount,
                payment_method, tax_period_id, notes, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.store_id)
        .bind(&sale.cashier_id)
        .bind(&sale.customer_id)
        .bind(&sale.customer_name)
        .bind(&sale.delivery_type)
        .bind(&sale.delivery_address)
        .bind(sale.delivery_price.to_string())
        .bind(&sale.invoice_number)
        .bind(sale.subtotal.to_string())
        .bind(sale.discount_percent.to_string())
        .bind(sale.discount_amount.to_string())
        .bind(sale.tax_amount.to_string())
        .bind(sale.total_amount.to_string())
        .bind(sale.gross_amount.to_string())
        .bind(sale.net_amount.to_string())
        .bind(sale.payment_method.to_string())
        .bind(&sale.tax_period_id)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .execute(&mut **tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, product_name, unit_price,
                    quantity, subtotal, tax_category, vat_rate, vat_amount,
                    total_amount
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.unit_price.to_string())
            .bind(item.quantity)
            .bind(item.subtotal.to_string())
            .bind(item.tax_category.to_string())
            .bind(item.vat_rate.to_string())
            .bind(item.vat_amount.to_string())
            .bind(item.total_amount.to_string())
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    /// Lists sales for a store, newest first, without line items.
    pub async fn list(
        &self,
        store_id: &str,
        filter: &SaleListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Sale>> {
        let mut builder = QueryBuilder::new(
            "SELECT id, store_id, cashier_id, customer_id, customer_name, \
             delivery_type, delivery_address, delivery_price, invoice_number, \
             subtotal, discount_percent, discount_amount, tax_amount, \
             total_amount, gross_amount, net_amount, payment_method, \
             tax_period_id, notes, created_at \
             FROM sales WHERE store_id = ",
        );
        builder.push_bind(store_id);

        if let Some(date_from) = filter.date_from {
            builder.push(" AND date(created_at) >= date(");
            builder.push_bind(date_from);
            builder.push(")");
        }
        if let Some(date_to) = filter.date_to {
            builder.push(" AND date(created_at) <= date(");
            builder.push_bind(date_to);
            builder.push(")");
        }
        if let Some(cashier_id) = &filter.cashier_id {
            builder.push(" AND cashier_id = ");
            builder.push_bind(cashier_id);
        }
        if let Some(payment_method) = &filter.payment_method {
            builder.push(" AND payment_method = ");
            builder.push_bind(payment_method);
        }

        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(limit.clamp(1, 100));
        builder.push(" OFFSET ");
        builder.push_bind(offset.max(0));

        let rows: Vec<SaleRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter().map(SaleRow::into_sale).collect()
    }

    /// Loads every sale linked to a tax period, each with its items.
    ///
    /// Serves period closure and the VAT report; both need the full line
    /// detail to split vatable from exempt amounts.
    pub async fn list_by_period_with_items(
        &self,
        store_id: &str,
        tax_period_id: &str,
    ) -> Result<Vec<SaleWithItems>> {
        let rows: Vec<SaleRow> = sqlx::query_as(
            r#"
            SELECT id, store_id, cashier_id, customer_id, customer_name,
                   delivery_type, delivery_address, delivery_price,
                   invoice_number, subtotal, discount_percent, discount_amount,
                   tax_amount, total_amount, gross_amount, net_amount,
                   payment_method, tax_period_id, notes, created_at
            FROM sales
            WHERE store_id = ? AND tax_period_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(store_id)
        .bind(tax_period_id)
        .fetch_all(&self.pool)
        .await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            let sale = row.into_sale()?;
            let items = self.find_items(&sale.id).await?;
            sales.push(SaleWithItems { sale, items });
        }

        Ok(sales)
    }

    /// Fetches the items of one sale, in insertion order.
    pub async fn find_items(&self, sale_id: &str) -> Result<Vec<SaleItem>> {
        let rows: Vec<SaleItemRow> = sqlx::query_as(
            r#"
            SELECT id, sale_id, product_id, product_name, unit_price,
                   quantity, subtotal, tax_category, vat_rate, vat_amount,
                   total_amount
            FROM sale_items
            WHERE sale_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SaleItemRow::into_item).collect()
    }
}

// Helper structs for database mapping

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    store_id: String,
    cashier_id: String,
    customer_id: Option<String>,
    customer_name: Option<String>,
    delivery_type: Option<String>,
    delivery_address: Option<String>,
    delivery_price: String,
    invoice_number: String,
    subtotal: String,
    discount_percent: String,
    discount_amount: String,
    tax_amount: String,
    total_amount: String,
    gross_amount: String,
    net_amount: String,
    payment_method: String,
    tax_period_id: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl SaleRow {
    fn into_sale(self) -> Result<Sale> {
        use crate::core::AppError;
        use std::str::FromStr;

        let payment_method = crate::modules::sales::models::PaymentMethod::from_str(
            &self.payment_method,
        )
        .map_err(AppError::Internal)?;

        Ok(Sale {
            delivery_price: parse_db_money(&self.delivery_price, "delivery_price")?,
            subtotal: parse_db_money(&self.subtotal, "subtotal")?,
            discount_percent: parse_db_money(&self.discount_percent, "discount_percent")?,
            discount_amount: parse_db_money(&self.discount_amount, "discount_amount")?,
            tax_amount: parse_db_money(&self.tax_amount, "tax_amount")?,
            total_amount: parse_db_money(&self.total_amount, "total_amount")?,
            gross_amount: parse_db_money(&self.gross_amount, "gross_amount")?,
            net_amount: parse_db_money(&self.net_amount, "net_amount")?,
            payment_method,
            id: self.id,
            store_id: self.store_id,
            cashier_id: self.cashier_id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            delivery_type: self.delivery_type,
            delivery_address: self.delivery_address,
            invoice_number: self.invoice_number,
            tax_period_id: self.tax_period_id,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SaleItemRow {
    id: String,
    sale_id: String,
    product_id: String,
    product_name: String,
    unit_price: String,
    quantity: i64,
    subtotal: String,
    tax_category: String,
    vat_rate: String,
    vat_amount: String,
    total_amount: String,
}

impl SaleItemRow {
    fn into_item(self) -> Result<SaleItem> {
        use crate::core::AppError;
        use std::str::FromStr;

        let tax_category = crate::modules::sales::models::TaxCategory::from_str(
            &self.tax_category,
        )
        .map_err(AppError::Internal)?;

        Ok(SaleItem {
            unit_price: parse_db_money(&self.unit_price, "unit_price")?,
            subtotal: parse_db_money(&self.subtotal, "subtotal")?,
            vat_rate: parse_db_money(&self.vat_rate, "vat_rate")?,
            vat_amount: parse_db_money(&self.vat_amount, "vat_amount")?,
            total_amount: parse_db_money(&self.total_amount, "total_amount")?,
            tax_category,
            id: self.id,
            sale_id: self.sale_id,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
        })
    }
}
