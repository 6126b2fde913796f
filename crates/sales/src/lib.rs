//! Customer orders and their fulfillment.
//!
//! [`Order`] carries the order status machine; [`OrderFulfillmentEngine`]
//! checks availability, reserves units, and drives orders through
//! processing, shipping, delivery and cancellation.

pub mod fulfillment;
pub mod order;
pub mod store;

#[cfg(test)]
mod testing;

pub use fulfillment::{OrderFulfillmentEngine, ProcessOutcome};
pub use order::{Order, OrderStatus};
pub use store::{OrderFilter, OrderStore};
