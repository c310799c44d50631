// VAT reconciliation report over a CLOSED period.
//
// Read-only projection: it recomputes the period's aggregates from the live
// sale/item/purchase rows and requires an exact match with the aggregates
// frozen at close time. A mismatch is a data-integrity bug and is surfaced
// as an error, never silently reconciled.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::catalog::repositories::StoreRepository;
use crate::modules::purchases::repositories::PurchaseRepository;
use crate::modules::sales::models::TaxCategory;
use crate::modules::sales::repositories::SaleRepository;
use crate::modules::taxes::models::PeriodAggregates;
use crate::modules::taxes::repositories::TaxPeriodRepository;
use crate::modules::taxes::services::period_service::compute_aggregates;

/// Business-identity header of the report.
#[derive(Debug, Serialize)]
pub struct BusinessIdentity {
    pub store_id: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportPeriod {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportTotals {
    pub gross_sales: Decimal,
    pub exempt_sales: Decimal,
    pub vatable_net_sales: Decimal,
    pub output_vat: Decimal,
    pub input_vat: Decimal,
    pub vat_payable: Decimal,
}

/// One settled invoice in the transaction breakdown.
#[derive(Debug, Serialize)]
pub struct ReportSaleLine {
    pub date: NaiveDate,
    pub invoice_number: String,
    pub vatable_net: Decimal,
    pub vat_amount: Decimal,
    pub items: Vec<String>,
}

/// One supplier invoice in the input-VAT breakdown.
#[derive(Debug, Serialize)]
pub struct ReportPurchaseLine {
    pub date: NaiveDate,
    pub supplier: String,
    pub invoice_number: String,
    pub net_amount: Decimal,
    pub vat_amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct VatReport {
    pub reference: String,
    pub business: BusinessIdentity,
    pub period: ReportPeriod,
    pub totals: ReportTotals,
    pub sales: Vec<ReportSaleLine>,
    pub purchases: Vec<ReportPurchaseLine>,
    pub generated_at: DateTime<Utc>,
}

pub struct VatReportService {
    period_repo: TaxPeriodRepository,
    sale_repo: SaleRepository,
    purchase_repo: PurchaseRepository,
    store_repo: StoreRepository,
}

impl VatReportService {
    pub fn new(
        period_repo: TaxPeriodRepository,
        sale_repo: SaleRepository,
        purchase_repo: PurchaseRepository,
        store_repo: StoreRepository,
    ) -> Self {
        Self {
            period_repo,
            sale_repo,
            purchase_repo,
            store_repo,
        }
    }

    /// Builds the reconciliation report for a CLOSED period.
    pub async fn build(&self, store_id: &str, period_id: &str) -> Result<VatReport> {
        let period = self
            .period_repo
            .find_by_id(store_id, period_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Tax period '{}'", period_id)))?;

        if !period.is_closed() {
            return Err(AppError::PeriodNotClosed(period_id.to_string()));
        }

        let frozen = period.aggregates.clone().ok_or_else(|| {
            AppError::Integrity(format!(
                "closed period '{}' has no frozen aggregates",
                period_id
            ))
        })?;

        let sales = self
            .sale_repo
            .list_by_period_with_items(store_id, period_id)
            .await?;
        let purchases = self
            .purchase_repo
            .list_by_period(store_id, period_id)
            .await?;

        let recomputed = compute_aggregates(&sales, &purchases);
        verify_against_frozen(period_id, &frozen, &recomputed)?;

        let mut exempt_sales = Decimal::ZERO;
        let mut sale_lines = Vec::with_capacity(sales.len());
        for sale in &sales {
            let mut vatable_net = Decimal::ZERO;
            let mut vat_amount = Decimal::ZERO;
            let mut item_names = Vec::with_capacity(sale.items.len());

            for item in &sale.items {
                match item.tax_category {
                    TaxCategory::Vatable => {
                        vatable_net += item.total_amount - item.vat_amount;
                        vat_amount += item.vat_amount;
                    }
                    TaxCategory::Exempt => {
                        exempt_sales += item.total_amount;
                    }
                }
                item_names.push(item.product_name.clone());
            }

            sale_lines.push(ReportSaleLine {
                date: sale.sale.created_at.date_naive(),
                invoice_number: sale.sale.invoice_number.clone(),
                vatable_net,
                vat_amount,
                items: item_names,
            });
        }

        let purchase_lines = purchases
            .iter()
            .map(|p| ReportPurchaseLine {
                date: p.purchase_date,
                supplier: p.supplier.clone(),
                invoice_number: p.invoice_number.clone(),
                net_amount: p.net_amount,
                vat_amount: p.vat_amount,
            })
            .collect();

        let store = self.store_repo.find_by_id(store_id).await?;
        let business = BusinessIdentity {
            store_id: store_id.to_string(),
            name: store.as_ref().map(|s| s.name.clone()),
            address: store.as_ref().and_then(|s| s.address.clone()),
            tax_id: store.as_ref().and_then(|s| s.tax_id.clone()),
        };

        let reference = report_reference(period.end_date);

        info!(period_id, reference = %reference, "VAT report generated");

        Ok(VatReport {
            reference,
            business,
            period: ReportPeriod {
                id: period.id,
                start_date: period.start_date,
                end_date: period.end_date,
                closed_at: period.closed_at,
                closed_by: period.closed_by,
            },
            totals: ReportTotals {
                gross_sales: recomputed.total_sales,
                exempt_sales,
                vatable_net_sales: recomputed.vatable_sales - recomputed.output_vat,
                output_vat: recomputed.output_vat,
                input_vat: recomputed.input_vat,
                vat_payable: recomputed.vat_payable,
            },
            sales: sale_lines,
            purchases: purchase_lines,
            generated_at: Utc::now(),
        })
    }
}

fn verify_against_frozen(
    period_id: &str,
    frozen: &PeriodAggregates,
    recomputed: &PeriodAggregates,
) -> Result<()> {
    if frozen == recomputed {
        return Ok(());
    }

    error!(
        period_id,
        ?frozen,
        ?recomputed,
        "Frozen aggregates diverge from live data"
    );

    Err(AppError::Integrity(format!(
        "period '{}' frozen aggregates do not match recomputation",
        period_id
    )))
}

/// Report reference of form `VAT-{year}-{month:02}-{4 base36 chars}`.
fn report_reference(period_end: NaiveDate) -> String {
    use chrono::Datelike;

    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut value = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(4);
    for _ in 0..4 {
        suffix.push(ALPHABET[(value % 36) as usize] as char);
        value /= 36;
    }

    format!(
        "VAT-{}-{:02}-{}",
        period_end.year(),
        period_end.month(),
        suffix
    )
}
