use rust_decimal::Decimal;
use std::str::FromStr;

use crate::core::error::{AppError, Result};

/// Flat statutory VAT rate, in percent.
///
/// Single-jurisdiction model: every vatable line and purchase uses this rate.
pub fn standard_vat_rate() -> Decimal {
    // 7.5%
    Decimal::new(75, 1)
}

/// Decimal scale used for all monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Rounds a monetary amount to the standard scale.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(MONEY_SCALE)
}

/// VAT charged on top of a net (VAT-exclusive) amount.
///
/// `vat = net × rate / 100`, rounded to money scale.
pub fn vat_on_net(net: Decimal, rate: Decimal) -> Decimal {
    round_money(net * rate / Decimal::from(100))
}

/// VAT portion embedded in a gross (VAT-inclusive) amount.
///
/// `vat = gross × rate / (100 + rate)`, rounded to money scale.
/// At 7.5%: gross 1075.00 carries 75.00 of VAT over 1000.00 net.
pub fn vat_in_gross(gross: Decimal, rate: Decimal) -> Decimal {
    round_money(gross * rate / (Decimal::from(100) + rate))
}

/// Parses a monetary amount persisted as canonical decimal TEXT.
///
/// The SQLite driver has no native Decimal codec, so every repository maps
/// money columns through this at the row boundary.
pub fn parse_db_money(value: &str, column: &str) -> Result<Decimal> {
    Decimal::from_str(value)
        .map_err(|e| AppError::internal(format!("Invalid {} in database: {}", column, e)))
}

/// Distributes a total across weighted shares without rounding drift.
///
/// Each share is `total × weight / Σweights` rounded to money scale, except
/// the last non-zero-weight share, which absorbs the remainder so the rounded
/// shares sum to `total` exactly. Zero weights receive zero.
///
/// Returns an empty vector for an empty weight list; a zero weight sum yields
/// all-zero shares with the full total on the last entry only when the total
/// itself is zero, otherwise the caller should not apportion at all.
pub fn apportion(total: Decimal, weights: &[Decimal]) -> Vec<Decimal> {
    if weights.is_empty() {
        return Vec::new();
    }

    let weight_sum: Decimal = weights.iter().copied().sum();
    if weight_sum.is_zero() {
        return weights.iter().map(|_| Decimal::ZERO).collect();
    }

    let last_nonzero = weights
        .iter()
        .rposition(|w| !w.is_zero())
        .expect("non-zero weight sum implies a non-zero weight");

    let mut shares = Vec::with_capacity(weights.len());
    let mut allocated = Decimal::ZERO;

    for (idx, weight) in weights.iter().enumerate() {
        let share = if weight.is_zero() {
            Decimal::ZERO
        } else if idx == last_nonzero {
            total - allocated
        } else {
            round_money(total * *weight / weight_sum)
        };
        allocated += share;
        shares.push(share);
    }

    shares
}
