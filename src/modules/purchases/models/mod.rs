pub mod purchase;

pub use purchase::{CreatePurchaseRequest, Purchase};
