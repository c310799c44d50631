// Purchase recording: the input-VAT peer of sale settlement, without the
// inventory leg. One transaction covers the purchase row, its tax ledger
// entry, and the audit trail.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::core::{money, Result};
use crate::modules::audit::models::AuditEntry;
use crate::modules::audit::repositories::AuditRepository;
use crate::modules::purchases::models::{CreatePurchaseRequest, Purchase};
use crate::modules::purchases::repositories::PurchaseRepository;
use crate::modules::taxes::repositories::TaxPeriodRepository;
use crate::modules::taxes::services::TaxRecorder;

/// Created purchase plus whether period assignment found an open period.
#[derive(Debug, Serialize)]
pub struct RecordedPurchase {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub tax_period_assigned: bool,
}

/// Listing with ledger-style aggregate sums.
#[derive(Debug, Serialize)]
pub struct PurchaseListing {
    pub purchases: Vec<Purchase>,
    pub total_gross: Decimal,
    pub total_vat: Decimal,
    pub total_net: Decimal,
}

pub struct PurchaseService {
    purchase_repo: PurchaseRepository,
    period_repo: TaxPeriodRepository,
    audit_repo: AuditRepository,
    tax_recorder: TaxRecorder,
}

impl PurchaseService {
    pub fn new(
        purchase_repo: PurchaseRepository,
        period_repo: TaxPeriodRepository,
        audit_repo: AuditRepository,
        tax_recorder: TaxRecorder,
    ) -> Self {
        Self {
            purchase_repo,
            period_repo,
            audit_repo,
            tax_recorder,
        }
    }

    /// Records a purchase, splitting VAT out of the gross when not supplied
    /// and assigning the open tax period containing the purchase date.
    ///
    /// Assignment failing (no period configured, or the date falls in a gap)
    /// is not an error; the purchase is recorded unassigned and the response
    /// says so.
    pub async fn record(
        &self,
        store_id: &str,
        user_id: &str,
        request: CreatePurchaseRequest,
    ) -> Result<RecordedPurchase> {
        request.validate()?;

        let (vat_amount, net_amount) =
            request.resolve_amounts(money::standard_vat_rate())?;

        let mut tx = self.purchase_repo.pool().begin().await?;

        let period = self
            .period_repo
            .find_open_containing(&mut tx, store_id, request.purchase_date)
            .await?;
        let tax_period_assigned = period.is_some();

        let purchase = Purchase {
            id: Uuid::new_v4().to_string(),
            store_id: store_id.to_string(),
            supplier: request.supplier.trim().to_string(),
            invoice_number: request.invoice_number.trim().to_string(),
            purchase_date: request.purchase_date,
            gross_amount: money::round_money(request.gross_amount),
            vat_amount,
            net_amount,
            tax_period_id: period.map(|p| p.id),
            created_at: Utc::now(),
        };

        self.purchase_repo.create_with_tx(&mut tx, &purchase).await?;
        self.tax_recorder.record_purchase(&mut tx, &purchase).await?;

        let entry = AuditEntry::new(store_id, "purchase", &purchase.id, "create", user_id)
            .with_snapshots(
                None,
                Some(serde_json::to_value(&purchase).map_err(|e| {
                    crate::core::AppError::internal(format!(
                        "Failed to snapshot purchase: {}",
                        e
                    ))
                })?),
            )
            .with_origin("api");
        self.audit_repo.create_with_tx(&mut tx, &entry).await?;

        tx.commit().await?;

        info!(
            purchase_id = %purchase.id,
            supplier = %purchase.supplier,
            vat = %purchase.vat_amount,
            tax_period_assigned,
            "Purchase recorded"
        );

        Ok(RecordedPurchase {
            purchase,
            tax_period_assigned,
        })
    }

    /// Store-scoped listing with aggregate sums over the returned page.
    pub async fn list(
        &self,
        store_id: &str,
        tax_period_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<PurchaseListing> {
        let purchases = self
            .purchase_repo
            .list(store_id, tax_period_id, limit, offset)
            .await?;

        let total_gross = purchases.iter().map(|p| p.gross_amount).sum();
        let total_vat = purchases.iter().map(|p| p.vat_amount).sum();
        let total_net = purchases.iter().map(|p| p.net_amount).sum();

        Ok(PurchaseListing {
            purchases,
            total_gross,
            total_vat,
            total_net,
        })
    }
}
