use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog product as seen by the settlement core.
///
/// The catalog collaborator owns the full product lifecycle; settlement only
/// reads price/stock and performs a bounded stock decrement. Stock can never
/// go negative as a result of settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub store_id: String,
    pub name: String,
    pub selling_price: Decimal,
    pub cost_price: Decimal,
    pub stock_quantity: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
