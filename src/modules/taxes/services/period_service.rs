// Tax period lifecycle: creation (with the non-overlap invariant), date-range
// assignment, and the one-way open → closed transition.
//
// Closing aggregates the period's sales and purchases into frozen summary
// fields. The flip itself is a status-guarded conditional update, so two
// racing close attempts resolve to exactly one success; the loser sees
// AlreadyClosed and writes nothing. Once closed, the frozen aggregates are
// authoritative and are never recomputed into the row again.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::audit::models::AuditEntry;
use crate::modules::audit::repositories::AuditRepository;
use crate::modules::purchases::models::Purchase;
use crate::modules::purchases::repositories::PurchaseRepository;
use crate::modules::sales::models::{SaleWithItems, TaxCategory};
use crate::modules::sales::repositories::SaleRepository;
use crate::modules::taxes::models::{
    CreateTaxPeriodRequest, PeriodAggregates, TaxPeriod,
};
use crate::modules::taxes::repositories::TaxPeriodRepository;

/// Full period detail: the period plus everything linked to it.
#[derive(Debug, Serialize)]
pub struct PeriodDetail {
    #[serde(flatten)]
    pub period: TaxPeriod,
    pub sales: Vec<SaleWithItems>,
    pub purchases: Vec<Purchase>,
}

pub struct PeriodService {
    period_repo: TaxPeriodRepository,
    sale_repo: SaleRepository,
    purchase_repo: PurchaseRepository,
    audit_repo: AuditRepository,
}

impl PeriodService {
    pub fn new(
        period_repo: TaxPeriodRepository,
        sale_repo: SaleRepository,
        purchase_repo: PurchaseRepository,
        audit_repo: AuditRepository,
    ) -> Self {
        Self {
            period_repo,
            sale_repo,
            purchase_repo,
            audit_repo,
        }
    }

    /// Creates a new OPEN period.
    ///
    /// Rejects any range overlapping an existing OPEN period of the same
    /// store, so date-range assignment always has at most one candidate.
    pub async fn create(
        &self,
        store_id: &str,
        request: CreateTaxPeriodRequest,
    ) -> Result<TaxPeriod> {
        request.validate()?;

        if self
            .period_repo
            .has_open_overlap(store_id, request.start_date, request.end_date)
            .await?
        {
            return Err(AppError::validation(
                "start_date",
                format!(
                    "range {}..{} overlaps an existing open tax period",
                    request.start_date, request.end_date
                ),
            ));
        }

        let period = TaxPeriod {
            id: Uuid::new_v4().to_string(),
            store_id: store_id.to_string(),
            start_date: request.start_date,
            end_date: request.end_date,
            status: crate::modules::taxes::models::PeriodStatus::Open,
            closed_at: None,
            closed_by: None,
            aggregates: None,
            created_at: Utc::now(),
        };

        self.period_repo.create(&period).await?;

        info!(period_id = %period.id, start = %period.start_date, end = %period.end_date, "Tax period opened");

        Ok(period)
    }

    pub async fn list(&self, store_id: &str) -> Result<Vec<TaxPeriod>> {
        self.period_repo.list(store_id).await
    }

    /// Period with its nested sales (including items) and purchases.
    pub async fn get_detail(&self, store_id: &str, period_id: &str) -> Result<PeriodDetail> {
        let period = self
            .period_repo
            .find_by_id(store_id, period_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Tax period '{}'", period_id)))?;

        let sales = self
            .sale_repo
            .list_by_period_with_items(store_id, period_id)
            .await?;
        let purchases = self
            .purchase_repo
            .list_by_period(store_id, period_id)
            .await?;

        Ok(PeriodDetail {
            period,
            sales,
            purchases,
        })
    }

    /// Closes an OPEN period exactly once.
    pub async fn close(
        &self,
        store_id: &str,
        user_id: &str,
        period_id: &str,
    ) -> Result<TaxPeriod> {
        let period = self
            .period_repo
            .find_by_id(store_id, period_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Tax period '{}'", period_id)))?;

        if period.is_closed() {
            return Err(AppError::AlreadyClosed(period_id.to_string()));
        }

        let sales = self
            .sale_repo
            .list_by_period_with_items(store_id, period_id)
            .await?;
        let purchases = self
            .purchase_repo
            .list_by_period(store_id, period_id)
            .await?;

        let aggregates = compute_aggregates(&sales, &purchases);
        let closed_at = Utc::now();

        let mut tx = self.period_repo.pool().begin().await?;

        let flipped = self
            .period_repo
            .close(&mut tx, store_id, period_id, closed_at, user_id, &aggregates)
            .await?;

        if !flipped {
            // Another close won the race between our status read and the
            // guarded update. Dropping the transaction rolls back.
            warn!(period_id, "Concurrent close detected");
            return Err(AppError::AlreadyClosed(period_id.to_string()));
        }

        let entry = AuditEntry::new(store_id, "tax_period", period_id, "close", user_id)
            .with_snapshots(
                Some(serde_json::json!({
                    "status": "open",
                })),
                Some(serde_json::json!({
                    "status": "closed",
                    "closed_at": closed_at,
                    "closed_by": user_id,
                    "total_sales": aggregates.total_sales,
                    "vatable_sales": aggregates.vatable_sales,
                    "output_vat": aggregates.output_vat,
                    "input_vat": aggregates.input_vat,
                    "vat_payable": aggregates.vat_payable,
                })),
            )
            .with_origin("api");
        self.audit_repo.create_with_tx(&mut tx, &entry).await?;

        tx.commit().await?;

        info!(
            period_id,
            vat_payable = %aggregates.vat_payable,
            "Tax period closed"
        );

        self.period_repo
            .find_by_id(store_id, period_id)
            .await?
            .ok_or_else(|| AppError::internal("Closed period disappeared"))
    }
}

/// Aggregates a period's linked sales and purchases.
///
/// Shared by closure (which freezes the result) and the VAT report (which
/// recomputes it and insists on an exact match with the frozen copy).
pub fn compute_aggregates(
    sales: &[SaleWithItems],
    purchases: &[Purchase],
) -> PeriodAggregates {
    let mut total_sales = Decimal::ZERO;
    let mut vatable_sales = Decimal::ZERO;
    let mut output_vat = Decimal::ZERO;

    for sale in sales {
        total_sales += sale.sale.gross_amount;
        for item in &sale.items {
            if item.tax_category == TaxCategory::Vatable {
                vatable_sales += item.total_amount;
                output_vat += item.vat_amount;
            }
        }
    }

    let input_vat: Decimal = purchases.iter().map(|p| p.vat_amount).sum();

    PeriodAggregates {
        total_sales,
        vatable_sales,
        output_vat,
        input_vat,
        vat_payable: output_vat - input_vat,
    }
}
