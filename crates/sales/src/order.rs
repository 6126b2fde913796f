use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CustomerId, DomainError, DomainResult, Entity, OrderId, ProductId};

/// Order status lifecycle.
///
/// ```text
/// Pending    -> Processing | Cancelled
/// Processing -> Shipped | Cancelled
/// Shipped    -> Delivered
/// Delivered, Cancelled: terminal
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn is_cancellable(self) -> bool {
        self.can_transition_to(OrderStatus::Cancelled)
    }
}

/// Customer order.
///
/// Line items map product → requested quantity. The order never holds unit
/// references; which units were reserved for it is fulfillment bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    lines: BTreeMap<ProductId, u32>,
    status: OrderStatus,
    /// Sum of quantity × unit price in smallest currency unit; zero until computed.
    total_amount: u64,
    created_at: DateTime<Utc>,
}

impl Order {
    /// New `Pending` order with a zero total.
    pub fn new(
        id: OrderId,
        customer_id: CustomerId,
        lines: BTreeMap<ProductId, u32>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("order must have at least one line item"));
        }
        if let Some((product_id, _)) = lines.iter().find(|(_, qty)| **qty == 0) {
            return Err(DomainError::validation(format!(
                "quantity for product {product_id} must be positive"
            )));
        }

        Ok(Self {
            id,
            customer_id,
            lines,
            status: OrderStatus::Pending,
            total_amount: 0,
            created_at,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn lines(&self) -> &BTreeMap<ProductId, u32> {
        &self.lines
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Total number of units requested across all lines.
    pub fn requested_units(&self) -> u64 {
        self.lines.values().map(|q| u64::from(*q)).sum()
    }

    /// Σ quantity × price, using `price_of` for each line's product.
    ///
    /// Overflow is a validation error rather than a wrapped total.
    pub fn calculate_total(
        &self,
        mut price_of: impl FnMut(ProductId) -> DomainResult<u64>,
    ) -> DomainResult<u64> {
        let overflow = || DomainError::validation("order total overflows");
        self.lines.iter().try_fold(0u64, |acc, (product_id, qty)| {
            let line = price_of(*product_id)?
                .checked_mul(u64::from(*qty))
                .ok_or_else(overflow)?;
            acc.checked_add(line).ok_or_else(overflow)
        })
    }

    /// Move to `next` if the lifecycle allows it; otherwise leave the order
    /// untouched and return `InvalidTransition`.
    pub fn transition_to(&mut self, next: OrderStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(self.status, next));
        }
        self.status = next;
        Ok(())
    }

    pub(crate) fn set_total_amount(&mut self, total: u64) {
        self.total_amount = total;
    }
}

impl Entity for Order {
    type Id = OrderId;
    const KIND: &'static str = "order";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
