//! Storage port for orders.

use std::sync::Arc;

use stockroom_core::{CustomerId, DomainResult, OrderId};

use crate::order::{Order, OrderStatus};

/// Equality filter over orders. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<CustomerId>,
}

impl OrderFilter {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            customer_id: None,
        }
    }

    pub fn customer(customer_id: CustomerId) -> Self {
        Self {
            status: None,
            customer_id: Some(customer_id),
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|s| order.status() == s)
            && self.customer_id.is_none_or(|c| order.customer_id() == c)
    }
}

pub trait OrderStore: Send + Sync {
    fn get_order(&self, id: OrderId) -> DomainResult<Option<Order>>;
    /// Insert a new order; an existing id is a `Conflict`.
    fn insert_order(&self, order: Order) -> DomainResult<()>;
    /// Replace an existing order; a missing id is `NotFound`.
    fn update_order(&self, order: Order) -> DomainResult<()>;
    fn list_orders(&self, filter: &OrderFilter) -> DomainResult<Vec<Order>>;
}

impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    fn get_order(&self, id: OrderId) -> DomainResult<Option<Order>> {
        (**self).get_order(id)
    }

    fn insert_order(&self, order: Order) -> DomainResult<()> {
        (**self).insert_order(order)
    }

    fn update_order(&self, order: Order) -> DomainResult<()> {
        (**self).update_order(order)
    }

    fn list_orders(&self, filter: &OrderFilter) -> DomainResult<Vec<Order>> {
        (**self).list_orders(filter)
    }
}
