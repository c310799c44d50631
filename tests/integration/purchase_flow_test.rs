// Purchase recording: the input-VAT peer of settlement. One transaction
// covers the purchase row, its tax ledger entry, and the audit trail;
// period assignment goes through the same date-range lookup as sales.

#[path = "../helpers/mod.rs"]
mod helpers;

use chrono::NaiveDate;
use helpers::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tillpoint::modules::purchases::models::CreatePurchaseRequest;
use tillpoint::modules::taxes::models::TransactionType;

fn purchase_request(gross: Decimal, purchase_date: NaiveDate) -> CreatePurchaseRequest {
    CreatePurchaseRequest {
        supplier: "Acme Wholesale".to_string(),
        invoice_number: "SUP-001".to_string(),
        purchase_date,
        gross_amount: gross,
        vat_amount: None,
        net_amount: None,
    }
}

#[tokio::test]
async fn gross_only_purchase_splits_at_the_flat_rate() {
    let pool = test_pool().await;
    seed_store(&pool, STORE).await;
    seed_open_period(&pool, STORE, "tp-1", date(2026, 1, 1), date(2026, 3, 31)).await;

    let recorded = purchase_service(&pool)
        .record(STORE, CASHIER, purchase_request(dec!(1075), date(2026, 2, 10)))
        .await
        .unwrap();

    // 1075 gross at 7.5% VAT-inclusive: 75 VAT over 1000 net.
    assert_eq!(recorded.purchase.vat_amount, dec!(75.00));
    assert_eq!(recorded.purchase.net_amount, dec!(1000.00));
    assert!(recorded.tax_period_assigned);
    assert_eq!(recorded.purchase.tax_period_id.as_deref(), Some("tp-1"));
}

#[tokio::test]
async fn purchase_writes_its_ledger_and_audit_rows_atomically() {
    let pool = test_pool().await;
    seed_store(&pool, STORE).await;

    let recorded = purchase_service(&pool)
        .record(STORE, CASHIER, purchase_request(dec!(1075), date(2026, 2, 10)))
        .await
        .unwrap();

    let records = tax_record_repository(&pool).list(STORE, None).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].transaction_type, TransactionType::Purchase);
    assert_eq!(records[0].source_id, recorded.purchase.id);
    assert_eq!(records[0].taxable_amount, dec!(1000.00));
    assert_eq!(records[0].vat_amount, dec!(75.00));

    let entries = audit_repository(&pool)
        .list_for_entity(STORE, "purchase", &recorded.purchase.id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "create");
    assert!(entries[0].old_value.is_none());
    assert_eq!(
        entries[0].new_value.as_ref().unwrap()["supplier"],
        "Acme Wholesale"
    );
}

#[tokio::test]
async fn purchase_outside_any_open_period_stays_unassigned() {
    let pool = test_pool().await;
    seed_store(&pool, STORE).await;
    seed_open_period(&pool, STORE, "tp-1", date(2026, 1, 1), date(2026, 3, 31)).await;

    let recorded = purchase_service(&pool)
        .record(STORE, CASHIER, purchase_request(dec!(1075), date(2026, 6, 1)))
        .await
        .unwrap();

    assert!(!recorded.tax_period_assigned);
    assert_eq!(recorded.purchase.tax_period_id, None);
}

#[tokio::test]
async fn explicit_amounts_must_reconcile_or_nothing_is_written() {
    let pool = test_pool().await;
    seed_store(&pool, STORE).await;

    let mut request = purchase_request(dec!(1075), date(2026, 2, 10));
    request.vat_amount = Some(dec!(75));
    request.net_amount = Some(dec!(900));

    let err = purchase_service(&pool)
        .record(STORE, CASHIER, request)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "validation_failed");
    assert_eq!(count_rows(&pool, "purchases").await, 0);
    assert_eq!(count_rows(&pool, "tax_records").await, 0);
    assert_eq!(count_rows(&pool, "audit_log").await, 0);
}

#[tokio::test]
async fn invalid_fields_are_all_reported_before_any_write() {
    let pool = test_pool().await;
    seed_store(&pool, STORE).await;

    let mut request = purchase_request(dec!(0), date(2026, 2, 10));
    request.supplier = "  ".to_string();
    request.invoice_number = String::new();

    let err = purchase_service(&pool)
        .record(STORE, CASHIER, request)
        .await
        .unwrap_err();

    match err {
        tillpoint::core::AppError::Validation(issues) => assert_eq!(issues.len(), 3),
        other => panic!("expected Validation, got {:?}", other),
    }
    assert_eq!(count_rows(&pool, "purchases").await, 0);
}

#[tokio::test]
async fn listing_sums_the_returned_page() {
    let pool = test_pool().await;
    seed_store(&pool, STORE).await;
    seed_open_period(&pool, STORE, "tp-1", date(2026, 1, 1), date(2026, 3, 31)).await;

    let service = purchase_service(&pool);
    service
        .record(STORE, CASHIER, purchase_request(dec!(1075), date(2026, 2, 10)))
        .await
        .unwrap();
    let mut second = purchase_request(dec!(215), date(2026, 2, 11));
    second.invoice_number = "SUP-002".to_string();
    service.record(STORE, CASHIER, second).await.unwrap();

    let listing = service.list(STORE, None, 50, 0).await.unwrap();

    assert_eq!(listing.purchases.len(), 2);
    assert_eq!(listing.total_gross, dec!(1290.00));
    assert_eq!(listing.total_vat, dec!(90.00));
    assert_eq!(listing.total_net, dec!(1200.00));

    // Narrowed to the period, both still match; a foreign store sees none.
    let by_period = service.list(STORE, Some("tp-1"), 50, 0).await.unwrap();
    assert_eq!(by_period.purchases.len(), 2);
    let foreign = service.list(OTHER_STORE, None, 50, 0).await.unwrap();
    assert!(foreign.purchases.is_empty());
}
