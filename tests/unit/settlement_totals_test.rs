// Property-based tests for settlement totals and the purchase gross split.
//
// The pricing pipeline is: line subtotal = unit price × quantity; cart
// subtotal = Σ lines; discount = subtotal × d%; tax = 7.5% of the discounted
// vatable subtotal; total = discounted subtotal + tax + delivery. Per-line
// VAT is an apportionment of the cart-level tax, so line VAT must sum to the
// sale tax exactly.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tillpoint::core::money;
use tillpoint::modules::purchases::models::CreatePurchaseRequest;

fn money_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// (unit price in cents, quantity) cart lines.
fn cart_lines() -> impl Strategy<Value = Vec<(i64, i64)>> {
    proptest::collection::vec((1i64..1_000_000, 1i64..20), 1..8)
}

proptest! {
    #[test]
    fn line_subtotals_sum_to_cart_subtotal_exactly(lines in cart_lines()) {
        let line_subtotals: Vec<Decimal> = lines
            .iter()
            .map(|&(price, qty)| money::round_money(money_cents(price) * Decimal::from(qty)))
            .collect();
        let subtotal: Decimal = line_subtotals.iter().copied().sum();

        // No rounding drift at the line level: the parts reassemble exactly.
        prop_assert_eq!(line_subtotals.iter().copied().sum::<Decimal>(), subtotal);
        prop_assert!(subtotal > Decimal::ZERO);
    }

    #[test]
    fn totals_identity_holds(
        lines in cart_lines(),
        discount_percent in 0u8..=100,
        delivery_cents in 0i64..100_000
    ) {
        let discount = Decimal::from(discount_percent);
        let hundred = Decimal::from(100);

        let line_subtotals: Vec<Decimal> = lines
            .iter()
            .map(|&(price, qty)| money::round_money(money_cents(price) * Decimal::from(qty)))
            .collect();
        let subtotal: Decimal = line_subtotals.iter().copied().sum();
        let discount_amount = money::round_money(subtotal * discount / hundred);
        let discounted_subtotal = subtotal - discount_amount;
        let tax = money::vat_on_net(discounted_subtotal, money::standard_vat_rate());
        let delivery = money_cents(delivery_cents);
        let total = discounted_subtotal + tax + delivery;

        prop_assert!(discount_amount <= subtotal);
        prop_assert!(discounted_subtotal >= Decimal::ZERO);
        prop_assert!(tax >= Decimal::ZERO);
        // The settlement invariant, exactly.
        prop_assert_eq!(total, discounted_subtotal + tax + delivery);
        prop_assert!(total >= discounted_subtotal);
    }

    #[test]
    fn line_vat_apportionment_sums_to_sale_tax(
        lines in cart_lines(),
        discount_percent in 0u8..=100
    ) {
        let discount = Decimal::from(discount_percent);
        let hundred = Decimal::from(100);

        let line_subtotals: Vec<Decimal> = lines
            .iter()
            .map(|&(price, qty)| money::round_money(money_cents(price) * Decimal::from(qty)))
            .collect();
        let subtotal: Decimal = line_subtotals.iter().copied().sum();
        let discounted = subtotal - money::round_money(subtotal * discount / hundred);
        let tax = money::vat_on_net(discounted, money::standard_vat_rate());

        let line_vat = money::apportion(tax, &line_subtotals);

        prop_assert_eq!(line_vat.iter().copied().sum::<Decimal>(), tax);
    }

    #[test]
    fn purchase_split_reassembles_the_gross(gross_cents in 1i64..1_000_000_000) {
        let request = CreatePurchaseRequest {
            supplier: "Acme Wholesale".to_string(),
            invoice_number: "SUP-001".to_string(),
            purchase_date: chrono::NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
            gross_amount: money_cents(gross_cents),
            vat_amount: None,
            net_amount: None,
        };

        let (vat, net) = request
            .resolve_amounts(money::standard_vat_rate())
            .unwrap();

        prop_assert!(vat >= Decimal::ZERO);
        prop_assert!(net >= Decimal::ZERO);
        prop_assert_eq!(net + vat, request.gross_amount);
    }

    #[test]
    fn inconsistent_explicit_split_is_rejected(
        gross_cents in 200i64..1_000_000_000,
        off_by in 1i64..100
    ) {
        let gross = money_cents(gross_cents);
        let vat = money::vat_in_gross(gross, money::standard_vat_rate());
        let request = CreatePurchaseRequest {
            supplier: "Acme Wholesale".to_string(),
            invoice_number: "SUP-001".to_string(),
            purchase_date: chrono::NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
            gross_amount: gross,
            vat_amount: Some(vat),
            net_amount: Some(gross - vat - money_cents(off_by)),
        };

        prop_assert!(request.resolve_amounts(money::standard_vat_rate()).is_err());
    }
}

#[test]
fn worked_example_settles_to_2618_75() {
    // Cart [2 × 1000, 1 × 500], 10% discount, 200 delivery, 7.5% VAT.
    let line_subtotals = [dec!(2000), dec!(500)];
    let subtotal: Decimal = line_subtotals.iter().copied().sum();
    let discount_amount = money::round_money(subtotal * dec!(10) / dec!(100));
    let discounted = subtotal - discount_amount;
    let tax = money::vat_on_net(discounted, money::standard_vat_rate());
    let total = discounted + tax + dec!(200);

    assert_eq!(subtotal, dec!(2500));
    assert_eq!(discount_amount, dec!(250));
    assert_eq!(discounted, dec!(2250));
    assert_eq!(tax, dec!(168.75));
    assert_eq!(total, dec!(2618.75));
}
