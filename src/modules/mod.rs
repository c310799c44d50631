pub mod audit;
pub mod catalog;
pub mod purchases;
pub mod sales;
pub mod taxes;

use std::sync::Arc;

use actix_web::web;
use sqlx::SqlitePool;

use crate::config::Settings;
use audit::repositories::AuditRepository;
use catalog::repositories::{ProductRepository, StoreRepository};
use purchases::repositories::PurchaseRepository;
use purchases::services::PurchaseService;
use sales::repositories::SaleRepository;
use sales::services::{SaleQueryService, SettlementService};
use taxes::repositories::{TaxPeriodRepository, TaxRecordRepository};
use taxes::services::{PeriodService, TaxRecorder, VatReportService};

/// Wires every repository and service onto one explicitly passed pool and
/// registers all routes. Both the binary and the test harness go through
/// this, so tests exercise the exact production wiring against their own
/// isolated database.
pub fn configure(cfg: &mut web::ServiceConfig, pool: &SqlitePool, settings: &Settings) {
    let product_repo = ProductRepository::new(pool.clone());
    let store_repo = StoreRepository::new(pool.clone());
    let sale_repo = SaleRepository::new(pool.clone());
    let period_repo = TaxPeriodRepository::new(pool.clone());
    let tax_record_repo = TaxRecordRepository::new(pool.clone());
    let purchase_repo = PurchaseRepository::new(pool.clone());
    let audit_repo = AuditRepository::new(pool.clone());

    let tax_recorder = TaxRecorder::new(tax_record_repo);

    let settlement_service = Arc::new(SettlementService::new(
        product_repo,
        sale_repo.clone(),
        period_repo.clone(),
        tax_recorder.clone(),
        settings.settlement.clone(),
    ));
    let sale_query_service = Arc::new(SaleQueryService::new(sale_repo.clone()));
    let period_service = Arc::new(PeriodService::new(
        period_repo.clone(),
        sale_repo.clone(),
        purchase_repo.clone(),
        audit_repo.clone(),
    ));
    let report_service = Arc::new(VatReportService::new(
        period_repo.clone(),
        sale_repo,
        purchase_repo.clone(),
        store_repo,
    ));
    let purchase_service = Arc::new(PurchaseService::new(
        purchase_repo,
        period_repo,
        audit_repo,
        tax_recorder,
    ));

    cfg.app_data(web::Data::new(settlement_service))
        .app_data(web::Data::new(sale_query_service))
        .app_data(web::Data::new(period_service))
        .app_data(web::Data::new(report_service))
        .app_data(web::Data::new(purchase_service))
        .configure(sales::controllers::sale_controller::configure)
        .configure(taxes::controllers::tax_period_controller::configure)
        .configure(taxes::controllers::tax_report_controller::configure)
        .configure(purchases::controllers::purchase_controller::configure);
}
