// Statutory tax period lifecycle.
//
// A period is OPEN while sales and purchases accrue to it, and flips to
// CLOSED exactly once. CLOSED is terminal: the aggregates written at close
// time are frozen and authoritative, and are never recomputed into the row
// again.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, FieldIssue, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    Open,
    Closed,
}

impl std::fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodStatus::Open => write!(f, "open"),
            PeriodStatus::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for PeriodStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "open" => Ok(PeriodStatus::Open),
            "closed" => Ok(PeriodStatus::Closed),
            _ => Err(format!("Invalid period status: {}", s)),
        }
    }
}

/// Aggregates frozen onto a period at close time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodAggregates {
    pub total_sales: Decimal,
    pub vatable_sales: Decimal,
    pub output_vat: Decimal,
    pub input_vat: Decimal,
    pub vat_payable: Decimal,
}

/// A bounded date range over which VAT accrues toward a single filing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxPeriod {
    pub id: String,
    pub store_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PeriodStatus,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<String>,
    pub aggregates: Option<PeriodAggregates>,
    pub created_at: DateTime<Utc>,
}

impl TaxPeriod {
    pub fn is_closed(&self) -> bool {
        self.status == PeriodStatus::Closed
    }

    /// Inclusive containment check used by period assignment.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Request body for `POST /tax-periods`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaxPeriodRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CreateTaxPeriodRequest {
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();

        if self.start_date > self.end_date {
            issues.push(FieldIssue::new(
                "start_date",
                format!(
                    "must not be after end_date ({} > {})",
                    self.start_date, self.end_date
                ),
            ));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(issues))
        }
    }
}
