// Contract tests for the tax period, tax report, and purchase endpoints,
// driven through the real actix App against an isolated in-memory database.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::{test, App};
use helpers::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;

fn as_decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("money fields serialize as strings")).unwrap()
}

macro_rules! spawn_app {
    ($pool:expr) => {{
        let pool = $pool.clone();
        let settings = test_settings();
        test::init_service(
            App::new().configure(move |cfg| tillpoint::modules::configure(cfg, &pool, &settings)),
        )
        .await
    }};
}

/// Sends a request with the store/user identity headers attached.
macro_rules! call {
    ($app:expr, $req:expr $(,)?) => {
        test::call_service(
            $app,
            $req.insert_header(("X-Store-Id", STORE))
                .insert_header(("X-User-Id", CASHIER))
                .to_request(),
        )
        .await
    };
}

#[actix_web::test]
async fn period_lifecycle_open_close_report() {
    let pool = test_pool().await;
    seed_store(&pool, STORE).await;
    seed_product(&pool, STORE, "prod-a", "Product A", "1000", 10).await;
    let app = spawn_app!(&pool);

    // Open a period spanning today.
    let resp = call!(
        &app,
        test::TestRequest::post().uri("/tax-periods").set_json(json!({
            "start_date": "2000-01-01",
            "end_date": "2099-12-31"
        })),
    );
    assert_eq!(resp.status(), 201);
    let period: Value = test::read_body_json(resp).await;
    assert_eq!(period["status"], "open");
    let period_id = period["id"].as_str().unwrap().to_string();

    // A report against the still-open period is refused.
    let resp = call!(
        &app,
        test::TestRequest::get().uri(&format!("/tax-reports/{}", period_id)),
    );
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "period_not_closed");

    // Settle a sale and record a purchase into the period.
    let resp = call!(
        &app,
        test::TestRequest::post().uri("/sales").set_json(json!({
            "items": [{ "product_id": "prod-a", "quantity": 2 }],
            "payment_method": "cash"
        })),
    );
    assert_eq!(resp.status(), 201);

    let resp = call!(
        &app,
        test::TestRequest::post().uri("/purchases").set_json(json!({
            "supplier": "Acme Wholesale",
            "invoice_number": "SUP-001",
            "purchase_date": chrono::Utc::now().date_naive(),
            "gross_amount": "1075"
        })),
    );
    assert_eq!(resp.status(), 201);
    let purchase: Value = test::read_body_json(resp).await;
    assert_eq!(purchase["tax_period_assigned"], true);
    assert_eq!(as_decimal(&purchase["vat_amount"]), dec!(75.00));
    assert_eq!(as_decimal(&purchase["net_amount"]), dec!(1000.00));

    // Close the period; the response carries the frozen aggregates.
    let resp = call!(
        &app,
        test::TestRequest::post().uri(&format!("/tax-periods/{}/close", period_id)),
    );
    assert_eq!(resp.status(), 200);
    let closed: Value = test::read_body_json(resp).await;
    assert_eq!(closed["status"], "closed");
    assert_eq!(closed["closed_by"], CASHIER);
    let aggregates = &closed["aggregates"];
    assert_eq!(as_decimal(&aggregates["total_sales"]), dec!(2150.00));
    assert_eq!(as_decimal(&aggregates["output_vat"]), dec!(150.00));
    assert_eq!(as_decimal(&aggregates["input_vat"]), dec!(75.00));
    assert_eq!(as_decimal(&aggregates["vat_payable"]), dec!(75.00));

    // A second close is rejected.
    let resp = call!(
        &app,
        test::TestRequest::post().uri(&format!("/tax-periods/{}/close", period_id)),
    );
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "already_closed");

    // Period detail nests the linked sales (with items) and purchases.
    let resp = call!(
        &app,
        test::TestRequest::get().uri(&format!("/tax-periods/{}", period_id)),
    );
    assert_eq!(resp.status(), 200);
    let detail: Value = test::read_body_json(resp).await;
    assert_eq!(detail["sales"].as_array().unwrap().len(), 1);
    assert_eq!(detail["sales"][0]["items"].as_array().unwrap().len(), 1);
    assert_eq!(detail["purchases"].as_array().unwrap().len(), 1);

    // The report now reconciles with the frozen aggregates.
    let resp = call!(
        &app,
        test::TestRequest::get().uri(&format!("/tax-reports/{}", period_id)),
    );
    assert_eq!(resp.status(), 200);
    let report: Value = test::read_body_json(resp).await;
    assert!(report["reference"].as_str().unwrap().starts_with("VAT-"));
    assert_eq!(as_decimal(&report["totals"]["output_vat"]), dec!(150.00));
    assert_eq!(as_decimal(&report["totals"]["input_vat"]), dec!(75.00));
    assert_eq!(as_decimal(&report["totals"]["vat_payable"]), dec!(75.00));
    assert_eq!(report["business"]["name"], "Main Street Retail");
    assert_eq!(report["sales"].as_array().unwrap().len(), 1);
    assert_eq!(report["purchases"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn overlapping_open_periods_are_rejected() {
    let pool = test_pool().await;
    seed_store(&pool, STORE).await;
    let app = spawn_app!(&pool);

    let resp = call!(
        &app,
        test::TestRequest::post().uri("/tax-periods").set_json(json!({
            "start_date": "2026-01-01",
            "end_date": "2026-03-31"
        })),
    );
    assert_eq!(resp.status(), 201);

    let resp = call!(
        &app,
        test::TestRequest::post().uri("/tax-periods").set_json(json!({
            "start_date": "2026-03-01",
            "end_date": "2026-05-31"
        })),
    );
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "validation_failed");

    // A disjoint range is accepted.
    let resp = call!(
        &app,
        test::TestRequest::post().uri("/tax-periods").set_json(json!({
            "start_date": "2026-04-01",
            "end_date": "2026-06-30"
        })),
    );
    assert_eq!(resp.status(), 201);
}

#[actix_web::test]
async fn inverted_period_range_is_rejected() {
    let pool = test_pool().await;
    seed_store(&pool, STORE).await;
    let app = spawn_app!(&pool);

    let resp = call!(
        &app,
        test::TestRequest::post().uri("/tax-periods").set_json(json!({
            "start_date": "2026-03-31",
            "end_date": "2026-01-01"
        })),
    );

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn unknown_period_ids_are_not_found() {
    let pool = test_pool().await;
    seed_store(&pool, STORE).await;
    let app = spawn_app!(&pool);

    for uri in [
        "/tax-periods/tp-missing",
        "/tax-reports/tp-missing",
    ] {
        let resp = call!(&app, test::TestRequest::get().uri(uri));
        assert_eq!(resp.status(), 404, "GET {} should be 404", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["kind"], "not_found");
    }

    let resp = call!(
        &app,
        test::TestRequest::post().uri("/tax-periods/tp-missing/close"),
    );
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn foreign_store_periods_stay_invisible() {
    let pool = test_pool().await;
    seed_store(&pool, STORE).await;
    seed_store(&pool, OTHER_STORE).await;
    seed_current_period(&pool, OTHER_STORE, "tp-theirs").await;
    let app = spawn_app!(&pool);

    let resp = call!(
        &app,
        test::TestRequest::get().uri("/tax-periods/tp-theirs"),
    );
    assert_eq!(resp.status(), 404);

    let resp = call!(
        &app,
        test::TestRequest::post().uri("/tax-periods/tp-theirs/close"),
    );
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn purchases_listing_returns_aggregate_sums() {
    let pool = test_pool().await;
    seed_store(&pool, STORE).await;
    let app = spawn_app!(&pool);

    for (invoice, gross) in [("SUP-001", "1075"), ("SUP-002", "215")] {
        let resp = call!(
            &app,
            test::TestRequest::post().uri("/purchases").set_json(json!({
                "supplier": "Acme Wholesale",
                "invoice_number": invoice,
                "purchase_date": "2026-02-10",
                "gross_amount": gross
            })),
        );
        assert_eq!(resp.status(), 201);
    }

    let resp = call!(&app, test::TestRequest::get().uri("/purchases"));
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["purchases"].as_array().unwrap().len(), 2);
    assert_eq!(as_decimal(&body["total_gross"]), dec!(1290.00));
    assert_eq!(as_decimal(&body["total_vat"]), dec!(90.00));
    assert_eq!(as_decimal(&body["total_net"]), dec!(1200.00));
}
