pub mod settlement_service;

pub use settlement_service::{SaleQueryService, SettlementService};
