use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{money, AppError, FieldIssue, Result};

/// An input-VAT purchase from a supplier.
///
/// Mirrors the sale settlement pattern without the inventory leg: recorded
/// once, assigned to an open tax period by date containment, and read back
/// by period closure and the VAT report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub store_id: String,
    pub supplier: String,
    pub invoice_number: String,
    pub purchase_date: NaiveDate,
    pub gross_amount: Decimal,
    pub vat_amount: Decimal,
    pub net_amount: Decimal,
    pub tax_period_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /purchases`.
///
/// `vat_amount`/`net_amount` may be omitted; the gross is then treated as
/// VAT-inclusive at the flat rate and split accordingly.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePurchaseRequest {
    pub supplier: String,
    pub invoice_number: String,
    pub purchase_date: NaiveDate,
    pub gross_amount: Decimal,
    #[serde(default)]
    pub vat_amount: Option<Decimal>,
    #[serde(default)]
    pub net_amount: Option<Decimal>,
}

impl CreatePurchaseRequest {
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();

        if self.supplier.trim().is_empty() {
            issues.push(FieldIssue::new("supplier", "must not be empty"));
        }
        if self.invoice_number.trim().is_empty() {
            issues.push(FieldIssue::new("invoice_number", "must not be empty"));
        }
        if self.gross_amount <= Decimal::ZERO {
            issues.push(FieldIssue::new("gross_amount", "must be positive"));
        }
        if let Some(vat) = self.vat_amount {
            if vat < Decimal::ZERO {
                issues.push(FieldIssue::new("vat_amount", "must not be negative"));
            }
        }
        if let Some(net) = self.net_amount {
            if net < Decimal::ZERO {
                issues.push(FieldIssue::new("net_amount", "must not be negative"));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(issues))
        }
    }

    /// Resolves the gross/VAT/net triple.
    ///
    /// When VAT and net are both supplied they must reconcile with the gross
    /// to the cent. When absent, the gross is split at the flat rate
    /// (VAT-inclusive): `vat = gross × rate / (100 + rate)`.
    pub fn resolve_amounts(&self, vat_rate: Decimal) -> Result<(Decimal, Decimal)> {
        let gross = money::round_money(self.gross_amount);

        match (self.vat_amount, self.net_amount) {
            (Some(vat), Some(net)) => {
                let vat = money::round_money(vat);
                let net = money::round_money(net);
                if net + vat != gross {
                    return Err(AppError::validation(
                        "gross_amount",
                        format!(
                            "does not reconcile: net {} + vat {} != gross {}",
                            net, vat, gross
                        ),
                    ));
                }
                Ok((vat, net))
            }
            (Some(vat), None) => {
                let vat = money::round_money(vat);
                Ok((vat, gross - vat))
            }
            (None, Some(net)) => {
                let net = money::round_money(net);
                Ok((gross - net, net))
            }
            (None, None) => {
                let vat = money::vat_in_gross(gross, vat_rate);
                Ok((vat, gross - vat))
            }
        }
    }
}
