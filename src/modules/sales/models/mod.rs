pub mod sale;
pub mod sale_item;

pub use sale::{CreateSaleRequest, PaymentMethod, Sale, SaleLineRequest, SaleWithItems};
pub use sale_item::{SaleItem, TaxCategory};
