// Property-based tests for the flat-VAT arithmetic in core::money.
//
// Covers:
// - VAT charged on top of a net amount (vat_on_net)
// - the VAT share embedded in a gross amount (vat_in_gross)
// - largest-remainder apportionment of a VAT total across weighted lines
//
// Uses proptest to validate the properties across many inputs.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tillpoint::core::money::{
    apportion, round_money, standard_vat_rate, vat_in_gross, vat_on_net,
};

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

proptest! {
    #[test]
    fn vat_on_net_is_non_negative_and_bounded(cents in 0i64..1_000_000_000) {
        let net = money(cents);
        let vat = vat_on_net(net, standard_vat_rate());

        prop_assert!(vat >= Decimal::ZERO);
        prop_assert!(vat <= net, "VAT {} exceeds net {}", vat, net);
    }

    #[test]
    fn vat_on_net_is_deterministic(cents in 0i64..1_000_000_000) {
        let net = money(cents);

        prop_assert_eq!(
            vat_on_net(net, standard_vat_rate()),
            vat_on_net(net, standard_vat_rate())
        );
    }

    #[test]
    fn vat_in_gross_splits_cleanly(cents in 1i64..1_000_000_000) {
        let gross = money(cents);
        let vat = vat_in_gross(gross, standard_vat_rate());
        let net = gross - vat;

        prop_assert!(vat >= Decimal::ZERO);
        prop_assert!(net >= Decimal::ZERO);
        // The split always reassembles to the gross exactly.
        prop_assert_eq!(net + vat, gross);
    }

    #[test]
    fn inclusive_vat_never_exceeds_exclusive_vat(cents in 0i64..1_000_000_000) {
        let amount = money(cents);

        // Backing VAT out of a gross always yields less than charging it on
        // top of the same figure treated as net.
        prop_assert!(
            vat_in_gross(amount, standard_vat_rate())
                <= vat_on_net(amount, standard_vat_rate())
        );
    }

    #[test]
    fn apportion_preserves_the_total(
        total_cents in 0i64..100_000_000,
        weights_cents in proptest::collection::vec(0i64..10_000_000, 1..8)
    ) {
        let total = money(total_cents);
        let weights: Vec<Decimal> = weights_cents.iter().map(|&c| money(c)).collect();
        prop_assume!(weights.iter().copied().sum::<Decimal>() > Decimal::ZERO);

        let shares = apportion(total, &weights);

        prop_assert_eq!(shares.len(), weights.len());
        prop_assert_eq!(shares.iter().copied().sum::<Decimal>(), total);
    }

    #[test]
    fn apportion_gives_zero_weights_zero_shares(
        total_cents in 0i64..100_000_000,
        weights_cents in proptest::collection::vec(0i64..10_000_000, 2..8)
    ) {
        let total = money(total_cents);
        let mut weights: Vec<Decimal> = weights_cents.iter().map(|&c| money(c)).collect();
        weights[0] = Decimal::ZERO;
        prop_assume!(weights.iter().copied().sum::<Decimal>() > Decimal::ZERO);

        let shares = apportion(total, &weights);

        prop_assert_eq!(shares[0], Decimal::ZERO);
    }

    #[test]
    fn round_money_is_idempotent(cents in -1_000_000_000i64..1_000_000_000) {
        let amount = money(cents);

        prop_assert_eq!(round_money(amount), amount);
        prop_assert_eq!(round_money(round_money(amount)), round_money(amount));
    }
}

#[test]
fn worked_example_from_the_tax_tables() {
    // 2250 net at 7.5% carries 168.75 of VAT on top.
    assert_eq!(vat_on_net(dec!(2250), standard_vat_rate()), dec!(168.75));

    // 1075 gross at 7.5% embeds 75 of VAT over a 1000 net.
    assert_eq!(vat_in_gross(dec!(1075), standard_vat_rate()), dec!(75.00));
}

#[test]
fn apportionment_matches_the_worked_cart() {
    // Sale tax 168.75 split across lines weighted 2000 : 500.
    let shares = apportion(dec!(168.75), &[dec!(2000), dec!(500)]);
    assert_eq!(shares, vec![dec!(135.00), dec!(33.75)]);
}
