// Tax period persistence and the open → closed transition.
//
// The close is a status-guarded conditional update: of two racing close
// attempts, exactly one flips the row. Frozen aggregates are written in the
// same statement and never touched again.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::core::money::parse_db_money;
use crate::core::Result;
use crate::modules::taxes::models::{PeriodAggregates, PeriodStatus, TaxPeriod};

#[derive(Debug, Clone)]
pub struct TaxPeriodRepository {
    pool: SqlitePool,
}

impl TaxPeriodRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts a new OPEN period. Overlap validation happens in the service
    /// before this is called.
    pub async fn create(&self, period: &TaxPeriod) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tax_periods (id, store_id, start_date, end_date, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&period.id)
        .bind(&period.store_id)
        .bind(period.start_date)
        .bind(period.end_date)
        .bind(period.status.to_string())
        .bind(period.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// True when any OPEN period of the store overlaps `[start, end]`.
    pub async fn has_open_overlap(
        &self,
        store_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM tax_periods
            WHERE store_id = ? AND status = 'open'
              AND start_date <= ? AND end_date >= ?
            "#,
        )
        .bind(store_id)
        .bind(end_date)
        .bind(start_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn find_by_id(&self, store_id: &str, id: &str) -> Result<Option<TaxPeriod>> {
        let row: Option<TaxPeriodRow> = sqlx::query_as(
            r#"
            SELECT id, store_id, start_date, end_date, status, closed_at,
                   closed_by, total_sales, vatable_sales, output_vat,
                   input_vat, vat_payable, created_at
            FROM tax_periods
            WHERE id = ? AND store_id = ?
            "#,
        )
        .bind(id)
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TaxPeriodRow::into_period).transpose()
    }

    pub async fn list(&self, store_id: &str) -> Result<Vec<TaxPeriod>> {
        let rows: Vec<TaxPeriodRow> = sqlx::query_as(
            r#"
            SELECT id, store_id, start_date, end_date, status, closed_at,
                   closed_by, total_sales, vatable_sales, output_vat,
                   input_vat, vat_payable, created_at
            FROM tax_periods
            WHERE store_id = ?
            ORDER BY start_date
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TaxPeriodRow::into_period).collect()
    }

    /// The OPEN period whose inclusive date range contains `date`, if any.
    ///
    /// Runs inside the caller's transaction so settlement and purchase
    /// recording assign periods with the same snapshot they write under.
    /// Ordered by start_date; overlap of OPEN ranges is prevented at
    /// creation, the ordering only pins behavior should legacy data
    /// violate that invariant.
    pub async fn find_open_containing(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        store_id: &str,
        date: NaiveDate,
    ) -> Result<Option<TaxPeriod>> {
        let row: Option<TaxPeriodRow> = sqlx::query_as(
            r#"
            SELECT id, store_id, start_date, end_date, status, closed_at,
                   closed_by, total_sales, vatable_sales, output_vat,
                   input_vat, vat_payable, created_at
            FROM tax_periods
            WHERE store_id = ? AND status = 'open'
              AND start_date <= ? AND end_date >= ?
            ORDER BY start_date
            LIMIT 1
            "#,
        )
        .bind(store_id)
        .bind(date)
        .bind(date)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(TaxPeriodRow::into_period).transpose()
    }

    /// Flips an OPEN period to CLOSED, freezing its aggregates.
    ///
    /// Guarded on `status = 'open'`: returns false when another close won
    /// the race (or the period was already closed), in which case nothing
    /// was written.
    pub async fn close(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        store_id: &str,
        period_id: &str,
        closed_at: DateTime<Utc>,
        closed_by: &str,
        aggregates: &PeriodAggregates,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tax_periods
            SET status = 'closed',
                closed_at = ?,
                closed_by = ?,
                total_sales = ?,
                vatable_sales = ?,
                output_vat = ?,
                input_vat = ?,
                vat_payable = ?
            WHERE id = ? AND store_id = ? AND status = 'open'
            "#,
        )
        .bind(closed_at)
        .bind(closed_by)
        .bind(aggregates.total_sales.to_string())
        .bind(aggregates.vatable_sales.to_string())
        .bind(aggregates.output_vat.to_string())
        .bind(aggregates.input_vat.to_string())
        .bind(aggregates.vat_payable.to_string())
        .bind(period_id)
        .bind(store_id)
        .execute(&mut **tx)
        .await?;

        let closed = result.rows_affected() > 0;
        debug!(period_id, closed, "Period close attempt");

        Ok(closed)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TaxPeriodRow {
    id: String,
    store_id: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    closed_at: Option<DateTime<Utc>>,
    closed_by: Option<String>,
    total_sales: Option<String>,
    vatable_sales: Option<String>,
    output_vat: Option<String>,
    input_vat: Option<String>,
    vat_payable: Option<String>,
    created_at: DateTime<Utc>,
}

impl TaxPeriodRow {
    fn into_period(self) -> Result<TaxPeriod> {
        use crate::core::AppError;
        use std::str::FromStr;

        let status = PeriodStatus::from_str(&self.status).map_err(AppError::Internal)?;

        let aggregates = match (
            &self.total_sales,
            &self.vatable_sales,
            &self.output_vat,
            &self.input_vat,
            &self.vat_payable,
        ) {
            (Some(total), Some(vatable), Some(output), Some(input), Some(payable)) => {
                Some(PeriodAggregates {
                    total_sales: parse_db_money(total, "total_sales")?,
                    vatable_sales: parse_db_money(vatable, "vatable_sales")?,
                    output_vat: parse_db_money(output, "output_vat")?,
                    input_vat: parse_db_money(input, "input_vat")?,
                    vat_payable: parse_db_money(payable, "vat_payable")?,
                })
            }
            _ => None,
        };

        Ok(TaxPeriod {
            id: self.id,
            store_id: self.store_id,
            start_date: self.start_date,
            end_date: self.end_date,
            status,
            closed_at: self.closed_at,
            closed_by: self.closed_by,
            aggregates,
            created_at: self.created_at,
        })
    }
}
