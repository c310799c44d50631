pub mod period_service;
pub mod tax_recorder;
pub mod vat_report_service;

pub use period_service::{PeriodDetail, PeriodService};
pub use tax_recorder::TaxRecorder;
pub use vat_report_service::{VatReport, VatReportService};
