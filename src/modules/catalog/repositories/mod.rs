pub mod product_repository;
pub mod store_repository;

pub use product_repository::ProductRepository;
pub use store_repository::{StoreIdentity, StoreRepository};
