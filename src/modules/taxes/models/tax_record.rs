use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of the VAT ledger a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Output VAT collected on a sale
    Sale,
    /// Input VAT paid on a purchase
    Purchase,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Sale => write!(f, "sale"),
            TransactionType::Purchase => write!(f, "purchase"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sale" => Ok(TransactionType::Sale),
            "purchase" => Ok(TransactionType::Purchase),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

/// One row of the append-only tax ledger.
///
/// Written in the same atomic unit as the sale or purchase it records;
/// never updated or deleted afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRecord {
    pub id: String,
    pub store_id: String,
    /// Sale or purchase id this record accrues for.
    pub source_id: String,
    pub transaction_type: TransactionType,
    pub taxable_amount: Decimal,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
    pub total_amount: Decimal,
    pub payment_method: Option<String>,
    /// Accrual month tag, `{year}-{zero-padded month}` of the wall-clock
    /// time the transaction settled (not its business date).
    pub period_tag: String,
    pub created_at: DateTime<Utc>,
}

impl TaxRecord {
    /// Derives the accrual month tag from a settlement timestamp.
    pub fn period_tag_for(at: DateTime<Utc>) -> String {
        at.format("%Y-%m").to_string()
    }
}
