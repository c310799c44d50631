// Settled sale with its payment and delivery details.
//
// A sale is created exactly once by the settlement transaction and never
// mutated afterwards. Totals obey:
//   total_amount == net_amount + tax_amount + delivery_price
//   net_amount   == subtotal - discount_amount
// gross_amount/net_amount duplicate the reporting figures used by period
// closure and the VAT report.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, FieldIssue, Result};
use crate::modules::sales::models::sale_item::{SaleItem, TaxCategory};

/// Accepted tender types for a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Other,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Transfer => write!(f, "transfer"),
            PaymentMethod::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "transfer" => Ok(PaymentMethod::Transfer),
            "other" => Ok(PaymentMethod::Other),
            _ => Err(format!("Invalid payment method: {}", s)),
        }
    }
}

/// A persisted sale header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub store_id: String,
    pub cashier_id: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub delivery_type: Option<String>,
    pub delivery_address: Option<String>,
    pub delivery_price: Decimal,
    pub invoice_number: String,
    pub subtotal: Decimal,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub gross_amount: Decimal,
    pub net_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub tax_period_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A sale with its line items, as returned by the settlement endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// One requested cart line.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleLineRequest {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub tax_category: Option<TaxCategory>,
}

/// Settlement request body for `POST /sales`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleRequest {
    pub items: Vec<SaleLineRequest>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub discount_percent: Option<Decimal>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub delivery_type: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub delivery_price: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateSaleRequest {
    /// Validates the request, reporting every field issue at once.
    ///
    /// All checks happen before any side effect; a request that fails here
    /// has touched nothing.
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();

        if self.items.is_empty() {
            issues.push(FieldIssue::new("items", "must contain at least one line"));
        }

        for (idx, line) in self.items.iter().enumerate() {
            if line.product_id.trim().is_empty() {
                issues.push(FieldIssue::new(
                    format!("items[{}].product_id", idx),
                    "must not be empty",
                ));
            }
            if line.quantity < 1 {
                issues.push(FieldIssue::new(
                    format!("items[{}].quantity", idx),
                    format!("must be at least 1, got {}", line.quantity),
                ));
            }
        }

        if let Some(discount) = self.discount_percent {
            if discount < Decimal::ZERO || discount > Decimal::from(100) {
                issues.push(FieldIssue::new(
                    "discount_percent",
                    format!("must be between 0 and 100, got {}", discount),
                ));
            }
        }

        if let Some(delivery_price) = self.delivery_price {
            if delivery_price < Decimal::ZERO {
                issues.push(FieldIssue::new(
                    "delivery_price",
                    "must not be negative",
                ));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(issues))
        }
    }

    pub fn discount_percent_or_zero(&self) -> Decimal {
        self.discount_percent.unwrap_or(Decimal::ZERO)
    }

    pub fn delivery_price_or_zero(&self) -> Decimal {
        self.delivery_price.unwrap_or(Decimal::ZERO)
    }
}
