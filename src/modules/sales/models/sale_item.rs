use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether VAT applies to a sale line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxCategory {
    Vatable,
    Exempt,
}

impl std::fmt::Display for TaxCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaxCategory::Vatable => write!(f, "vatable"),
            TaxCategory::Exempt => write!(f, "exempt"),
        }
    }
}

impl std::str::FromStr for TaxCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "vatable" => Ok(TaxCategory::Vatable),
            "exempt" => Ok(TaxCategory::Exempt),
            _ => Err(format!("Invalid tax category: {}", s)),
        }
    }
}

/// One line of a settled sale.
///
/// Product name and unit price are snapshots taken at settlement time, so
/// the sale history survives later catalog edits. Lines are immutable once
/// written. `subtotal` is the undiscounted `unit_price × quantity`;
/// `total_amount` is the line's discounted share plus its VAT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
    pub subtotal: Decimal,
    pub tax_category: TaxCategory,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
    pub total_amount: Decimal,
}
