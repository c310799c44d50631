pub mod tax_period_repository;
pub mod tax_record_repository;

pub use tax_period_repository::TaxPeriodRepository;
pub use tax_record_repository::TaxRecordRepository;
