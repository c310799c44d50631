pub mod tax_period_controller;
pub mod tax_report_controller;
