//! Shared building blocks for the allocation engine.
//!
//! Typed identifiers, the domain error model, physical dimensions and the
//! per-key lock table used to serialize occupancy and reservation changes.

pub mod dimensions;
pub mod entity;
pub mod error;
pub mod id;
pub mod lock_table;

pub use dimensions::Dimensions;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, LocationId, OrderId, ProductId, UnitId};
pub use lock_table::LockTable;
