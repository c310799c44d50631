use chrono::Utc;
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

use crate::core::{money, Result};
use crate::modules::purchases::models::Purchase;
use crate::modules::sales::models::Sale;
use crate::modules::taxes::models::{TaxRecord, TransactionType};
use crate::modules::taxes::repositories::TaxRecordRepository;

/// Writes the per-transaction tax ledger row.
///
/// Runs as the final step of the settlement (or purchase) unit of work, in
/// the same transaction: if the sale commits, the accrual committed with it.
/// The recorder needs no tax period to exist; the ledger is tagged by the
/// wall-clock accrual month instead.
#[derive(Debug, Clone)]
pub struct TaxRecorder {
    tax_record_repo: TaxRecordRepository,
}

impl TaxRecorder {
    pub fn new(tax_record_repo: TaxRecordRepository) -> Self {
        Self { tax_record_repo }
    }

    /// Records output VAT for a settled sale.
    pub async fn record_sale(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sale: &Sale,
    ) -> Result<TaxRecord> {
        let record = TaxRecord {
            id: Uuid::new_v4().to_string(),
            store_id: sale.store_id.clone(),
            source_id: sale.id.clone(),
            transaction_type: TransactionType::Sale,
            taxable_amount: sale.net_amount,
            vat_rate: money::standard_vat_rate(),
            vat_amount: sale.tax_amount,
            total_amount: sale.total_amount,
            payment_method: Some(sale.payment_method.to_string()),
            period_tag: TaxRecord::period_tag_for(sale.created_at),
            created_at: sale.created_at,
        };

        self.tax_record_repo.create_with_tx(tx, &record).await?;

        Ok(record)
    }

    /// Records input VAT for a recorded purchase.
    pub async fn record_purchase(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        purchase: &Purchase,
    ) -> Result<TaxRecord> {
        let now = Utc::now();

        let record = TaxRecord {
            id: Uuid::new_v4().to_string(),
            store_id: purchase.store_id.clone(),
            source_id: purchase.id.clone(),
            transaction_type: TransactionType::Purchase,
            taxable_amount: purchase.net_amount,
            vat_rate: money::standard_vat_rate(),
            vat_amount: purchase.vat_amount,
            total_amount: purchase.gross_amount,
            payment_method: None,
            period_tag: TaxRecord::period_tag_for(now),
            created_at: now,
        };

        self.tax_record_repo.create_with_tx(tx, &record).await?;

        Ok(record)
    }
}
