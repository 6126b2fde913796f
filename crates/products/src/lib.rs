//! Product catalog records.
//!
//! The engine only reads products (for dimensions and prices); creation and
//! updates are pass-through to whatever implements [`ProductCatalog`].

pub mod catalog;
pub mod product;

pub use catalog::ProductCatalog;
pub use product::Product;
