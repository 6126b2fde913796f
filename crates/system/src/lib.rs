//! The inventory system facade: wires storage, placement, unit lifecycle and
//! order fulfillment together behind boolean-style operations.

pub mod facade;
pub mod report;

pub use facade::InventorySystem;
pub use report::InventoryReport;
