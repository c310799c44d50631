pub mod tax_period;
pub mod tax_record;

pub use tax_period::{CreateTaxPeriodRequest, PeriodAggregates, PeriodStatus, TaxPeriod};
pub use tax_record::{TaxRecord, TransactionType};
