// Sale settlement: one atomic unit of work that validates stock, prices the
// cart, decrements inventory, persists the sale with its items, assigns the
// open tax period, and appends the tax accrual row.
//
// The transaction is the unit of work: acquired from the pool, committed on
// the single success path, rolled back on drop on every other exit (early
// return, error, or wall-clock timeout). A failed settlement leaves no
// observable writes.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Sqlite, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::SettlementConfig;
use crate::core::{money, AppError, Result};
use crate::modules::catalog::models::Product;
use crate::modules::catalog::repositories::ProductRepository;
use crate::modules::sales::models::{
    CreateSaleRequest, PaymentMethod, Sale, SaleItem, SaleWithItems, TaxCategory,
};
use crate::modules::sales::repositories::SaleRepository;
use crate::modules::taxes::repositories::TaxPeriodRepository;
use crate::modules::taxes::services::TaxRecorder;

pub struct SettlementService {
    product_repo: ProductRepository,
    sale_repo: SaleRepository,
    period_repo: TaxPeriodRepository,
    tax_recorder: TaxRecorder,
    config: SettlementConfig,
}

impl SettlementService {
    pub fn new(
        product_repo: ProductRepository,
        sale_repo: SaleRepository,
        period_repo: TaxPeriodRepository,
        tax_recorder: TaxRecorder,
        config: SettlementConfig,
    ) -> Self {
        Self {
            product_repo,
            sale_repo,
            period_repo,
            tax_recorder,
            config,
        }
    }

    /// Settles a cart for the given store and cashier.
    ///
    /// Validation happens before anything touches the database; the write
    /// section runs inside one transaction bounded by the configured
    /// wall-clock budget. On timeout the transaction is dropped (and rolled
    /// back) and the caller sees `TransactionTimeout`; retrying the whole
    /// request is safe, since nothing was committed.
    pub async fn settle(
        &self,
        store_id: &str,
        cashier_id: &str,
        request: CreateSaleRequest,
    ) -> Result<SaleWithItems> {
        request.validate()?;

        let budget = Duration::from_millis(self.config.execution_timeout_ms);

        match tokio::time::timeout(budget, self.settle_in_tx(store_id, cashier_id, &request))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(store_id, "Settlement exceeded its execution budget");
                Err(AppError::TransactionTimeout(format!(
                    "settlement exceeded {}ms budget",
                    self.config.execution_timeout_ms
                )))
            }
        }
    }

    async fn settle_in_tx(
        &self,
        store_id: &str,
        cashier_id: &str,
        request: &CreateSaleRequest,
    ) -> Result<SaleWithItems> {
        let now = Utc::now();
        let mut tx = self.sale_repo.pool().begin().await?;

        // Distinct product ids in first-seen order; repeated lines for the
        // same product are checked and decremented cumulatively.
        let mut distinct_ids: Vec<String> = Vec::new();
        let mut requested_totals: HashMap<String, i64> = HashMap::new();
        for line in &request.items {
            if !requested_totals.contains_key(&line.product_id) {
                distinct_ids.push(line.product_id.clone());
            }
            *requested_totals.entry(line.product_id.clone()).or_insert(0) += line.quantity;
        }

        let products = self
            .product_repo
            .find_active_by_ids(&mut tx, store_id, &distinct_ids)
            .await?;

        if products.len() != distinct_ids.len() {
            let found: HashSet<&str> = products.iter().map(|p| p.id.as_str()).collect();
            let missing: Vec<&str> = distinct_ids
                .iter()
                .map(String::as_str)
                .filter(|id| !found.contains(id))
                .collect();
            return Err(AppError::ProductUnavailable(missing.join(", ")));
        }

        let by_id: HashMap<&str, &Product> =
            products.iter().map(|p| (p.id.as_str(), p)).collect();

        // Snapshot availability check. The guarded decrement below re-checks
        // on write; this pass exists to fail fast with accurate quantities.
        for product_id in &distinct_ids {
            let product = by_id[product_id.as_str()];
            let requested = requested_totals[product_id];
            if product.stock_quantity < requested {
                return Err(AppError::InsufficientStock {
                    product_id: product_id.clone(),
                    available: product.stock_quantity,
                    requested,
                });
            }
        }

        let totals = price_cart(request, &by_id);

        // Write section. Each decrement is conditional on sufficient stock;
        // any rejection aborts the whole settlement.
        for product_id in &distinct_ids {
            let requested = requested_totals[product_id];
            let decremented = self
                .product_repo
                .decrement_stock(&mut tx, store_id, product_id, requested)
                .await?;

            if !decremented {
                let available = self
                    .product_repo
                    .stock_quantity(&mut tx, store_id, product_id)
                    .await?
                    .unwrap_or(0);
                return Err(AppError::InsufficientStock {
                    product_id: product_id.clone(),
                    available,
                    requested,
                });
            }
        }

        let invoice_number = self
            .sale_repo
            .next_invoice_number(&mut tx, store_id, now)
            .await?;

        let period = self
            .period_repo
            .find_open_containing(&mut tx, store_id, now.date_naive())
            .await?;

        let sale_id = Uuid::new_v4().to_string();
        let sale = Sale {
            id: sale_id.clone(),
            store_id: store_id.to_string(),
            cashier_id: cashier_id.to_string(),
            customer_id: request.customer_id.clone(),
            customer_name: request.customer_name.clone(),
            delivery_type: request.delivery_type.clone(),
            delivery_address: request.delivery_address.clone(),
            delivery_price: totals.delivery_price,
            invoice_number,
            subtotal: totals.subtotal,
            discount_percent: totals.discount_percent,
            discount_amount: totals.discount_amount,
            tax_amount: totals.tax_amount,
            total_amount: totals.total_amount,
            gross_amount: totals.total_amount,
            net_amount: totals.discounted_subtotal,
            payment_method: request.payment_method,
            tax_period_id: period.map(|p| p.id),
            notes: request.notes.clone(),
            created_at: now,
        };

        let items = build_items(&sale_id, &totals);

        self.sale_repo.create_with_tx(&mut tx, &sale, &items).await?;
        self.tax_recorder.record_sale(&mut tx, &sale).await?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            invoice_number = %sale.invoice_number,
            total = %sale.total_amount,
            "Sale settled"
        );

        Ok(SaleWithItems { sale, items })
    }
}

/// One priced cart line, pre-persistence.
struct PricedLine {
    product_id: String,
    product_name: String,
    unit_price: Decimal,
    quantity: i64,
    subtotal: Decimal,
    tax_category: TaxCategory,
    discounted_subtotal: Decimal,
}

/// Cart-level pricing outcome.
struct CartTotals {
    lines: Vec<PricedLine>,
    subtotal: Decimal,
    discount_percent: Decimal,
    discount_amount: Decimal,
    discounted_subtotal: Decimal,
    tax_amount: Decimal,
    delivery_price: Decimal,
    total_amount: Decimal,
    line_vat: Vec<Decimal>,
}

/// Prices a validated cart.
///
/// The cart-level figure is authoritative: tax is 7.5% of the discounted
/// vatable subtotal. Per-line VAT is an apportionment of that total weighted
/// by line subtotal, so line VAT sums to the sale tax exactly.
fn price_cart(request: &CreateSaleRequest, by_id: &HashMap<&str, &Product>) -> CartTotals {
    let discount_percent = request.discount_percent_or_zero();
    let hundred = Decimal::from(100);

    let mut lines = Vec::with_capacity(request.items.len());
    let mut subtotal = Decimal::ZERO;
    let mut vatable_subtotal = Decimal::ZERO;

    for line in &request.items {
        let product = by_id[line.product_id.as_str()];
        let line_subtotal = money::round_money(
            product.selling_price * Decimal::from(line.quantity),
        );
        let tax_category = line.tax_category.unwrap_or(TaxCategory::Vatable);
        let line_discount = money::round_money(line_subtotal * discount_percent / hundred);

        subtotal += line_subtotal;
        if tax_category == TaxCategory::Vatable {
            vatable_subtotal += line_subtotal;
        }

        lines.push(PricedLine {
            product_id: line.product_id.clone(),
            product_name: product.name.clone(),
            unit_price: product.selling_price,
            quantity: line.quantity,
            subtotal: line_subtotal,
            tax_category,
            discounted_subtotal: line_subtotal - line_discount,
        });
    }

    let discount_amount = money::round_money(subtotal * discount_percent / hundred);
    let discounted_subtotal = subtotal - discount_amount;
    let discounted_vatable =
        vatable_subtotal - money::round_money(vatable_subtotal * discount_percent / hundred);
    let tax_amount = money::vat_on_net(discounted_vatable, money::standard_vat_rate());
    let delivery_price = money::round_money(request.delivery_price_or_zero());
    let total_amount = discounted_subtotal + tax_amount + delivery_price;

    let weights: Vec<Decimal> = lines
        .iter()
        .map(|l| {
            if l.tax_category == TaxCategory::Vatable {
                l.subtotal
            } else {
                Decimal::ZERO
            }
        })
        .collect();
    let line_vat = money::apportion(tax_amount, &weights);

    CartTotals {
        lines,
        subtotal,
        discount_percent,
        discount_amount,
        discounted_subtotal,
        tax_amount,
        delivery_price,
        total_amount,
        line_vat,
    }
}

fn build_items(sale_id: &str, totals: &CartTotals) -> Vec<SaleItem> {
    totals
        .lines
        .iter()
        .zip(&totals.line_vat)
        .map(|(line, vat_amount)| SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            product_id: line.product_id.clone(),
            product_name: line.product_name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            subtotal: line.subtotal,
            tax_category: line.tax_category,
            vat_rate: match line.tax_category {
                TaxCategory::Vatable => money::standard_vat_rate(),
                TaxCategory::Exempt => Decimal::ZERO,
            },
            vat_amount: *vat_amount,
            total_amount: line.discounted_subtotal + *vat_amount,
        })
        .collect()
}

/// Read side of the sales module: filtered listing over settled sales.
pub struct SaleQueryService {
    sale_repo: SaleRepository,
}

impl SaleQueryService {
    pub fn new(sale_repo: SaleRepository) -> Self {
        Self { sale_repo }
    }

    pub async fn list(
        &self,
        store_id: &str,
        filter: &crate::modules::sales::repositories::SaleListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Sale>> {
        self.sale_repo.list(store_id, filter, limit, offset).await
    }
}

// Used by the controller to reject unparseable payment method filters early.
pub fn parse_payment_method_filter(value: &str) -> Result<PaymentMethod> {
    value
        .parse()
        .map_err(|e: String| AppError::validation("payment_method", e))
}
