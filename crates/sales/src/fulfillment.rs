//! Order fulfillment: availability checks, unit reservation and the order
//! status machine.
//!
//! ## Concurrency
//!
//! - Each order's state changes run under that order's lock.
//! - `process_order` holds the locks of every product on the order (taken in
//!   ascending id order) across the availability scan and the reservations,
//!   so two orders drawing on the same product cannot both see the same units
//!   as available. Each reservation is additionally a compare-and-swap under
//!   the unit's lock.
//! - Lock order is order → product → unit → location.
//!
//! ## Reservation ledger
//!
//! The engine records which units each order reserved. Cancelling releases
//! exactly those units, and a processing attempt that runs short releases the
//! units it reserved before cancelling the order.
//!
//! Ledger entries for a product's units are only written while that product's
//! lock is held. Units listed in the ledger move only through the engine;
//! [`OrderFulfillmentEngine::transition_unit`] refuses them.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use stockroom_core::{CustomerId, DomainError, DomainResult, LockTable, OrderId, ProductId, UnitId};
use stockroom_inventory::{LocationStore, Unit, UnitLifecycleManager, UnitStatus, UnitStore};
use stockroom_products::ProductCatalog;

use crate::order::{Order, OrderStatus};
use crate::store::{OrderFilter, OrderStore};

/// Result of a processing attempt that got past validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Every line was reserved; the order is `Shipped`.
    Shipped { reserved: Vec<UnitId> },
    /// A line ran short; partial reservations were released and the order is
    /// `Cancelled`.
    Cancelled {
        product_id: ProductId,
        requested: u32,
        reserved: u32,
    },
}

impl ProcessOutcome {
    pub fn is_shipped(&self) -> bool {
        matches!(self, ProcessOutcome::Shipped { .. })
    }
}

#[derive(Debug)]
pub struct OrderFulfillmentEngine<S> {
    store: S,
    units: Arc<UnitLifecycleManager<S>>,
    order_locks: LockTable<OrderId>,
    product_locks: LockTable<ProductId>,
    reservations: RwLock<HashMap<OrderId, Vec<UnitId>>>,
}

impl<S> OrderFulfillmentEngine<S>
where
    S: OrderStore + UnitStore + LocationStore + ProductCatalog + Clone,
{
    pub fn new(store: S, units: Arc<UnitLifecycleManager<S>>) -> Self {
        Self {
            store,
            units,
            order_locks: LockTable::new(),
            product_locks: LockTable::new(),
            reservations: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_order(&self, id: OrderId) -> DomainResult<Option<Order>> {
        self.store.get_order(id)
    }

    pub fn list_orders(&self, status: Option<OrderStatus>) -> DomainResult<Vec<Order>> {
        self.store.list_orders(&OrderFilter {
            status,
            customer_id: None,
        })
    }

    /// A customer's orders, newest first.
    pub fn order_history(&self, customer_id: CustomerId) -> DomainResult<Vec<Order>> {
        let mut orders = self.store.list_orders(&OrderFilter::customer(customer_id))?;
        orders.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id_typed().cmp(&a.id_typed()))
        });
        Ok(orders)
    }

    /// Units currently reserved on behalf of `order_id`.
    pub fn reserved_units(&self, order_id: OrderId) -> DomainResult<Vec<UnitId>> {
        let ledger = self
            .reservations
            .read()
            .map_err(|_| DomainError::storage("reservation ledger lock poisoned"))?;
        Ok(ledger.get(&order_id).cloned().unwrap_or_default())
    }

    /// Validate availability, price the order and persist it as `Pending`.
    ///
    /// Fails with `InsufficientStock` naming the first line (in product id
    /// order) whose available unit count is below the requested quantity.
    /// Nothing is reserved here; stock is only claimed by `process_order`.
    pub fn create_order(&self, order: Order) -> DomainResult<Order> {
        if order.status() != OrderStatus::Pending {
            return Err(DomainError::validation("new orders must be pending"));
        }
        let order_id = order.id_typed();
        if self.store.get_order(order_id)?.is_some() {
            return Err(DomainError::conflict(format!("order {order_id} already exists")));
        }

        for (product_id, requested) in order.lines() {
            let available = self.units.count_available(*product_id)?;
            if available < *requested as usize {
                return Err(DomainError::insufficient_stock(*product_id, *requested, available));
            }
        }

        let total = order.calculate_total(|product_id| {
            self.store
                .get_product(product_id)?
                .map(|p| p.unit_price())
                .ok_or_else(|| DomainError::not_found("product", product_id))
        })?;

        let mut order = order;
        order.set_total_amount(total);
        self.store.insert_order(order.clone())?;

        info!(
            order_id = %order_id,
            customer_id = %order.customer_id(),
            total_amount = total,
            "order created"
        );
        Ok(order)
    }

    /// Reserve units for a `Pending` order and ship it.
    ///
    /// `NotFound` / `InvalidTransition` when the order is absent or not
    /// pending. Otherwise the order ends `Shipped` with exactly Σ requested
    /// units reserved, or `Cancelled` with none of this attempt's reservations
    /// left behind. A storage failure while reserving also cancels the order
    /// before the error is returned.
    ///
    /// If only the final `Shipped` write fails, the reservations are already
    /// recorded: the order stays `Processing` and `cancel_order` releases them.
    pub fn process_order(&self, order_id: OrderId) -> DomainResult<ProcessOutcome> {
        self.order_locks.with_lock(order_id, || -> DomainResult<ProcessOutcome> {
            let mut order = self.load(order_id)?;
            if order.status() != OrderStatus::Pending {
                return Err(DomainError::invalid_transition(
                    order.status(),
                    OrderStatus::Processing,
                ));
            }
            order.transition_to(OrderStatus::Processing)?;
            self.store.update_order(order.clone())?;

            let products: Vec<ProductId> = order.lines().keys().copied().collect();
            let attempt = self.product_locks.with_locks(products, || {
                let mut reserved = Vec::new();
                let result = self
                    .reserve_lines(&order, &mut reserved)
                    .and_then(|shortfall| match shortfall {
                        None => self.record_reservations(order_id, &reserved).map(|()| None),
                        some => Ok(some),
                    });
                match result {
                    Ok(None) => Ok(ProcessOutcome::Shipped { reserved }),
                    Ok(Some(shortfall)) => {
                        self.release_units(order_id, &reserved);
                        Ok(shortfall)
                    }
                    Err(e) => {
                        self.release_units(order_id, &reserved);
                        Err(e)
                    }
                }
            });

            match attempt {
                Ok(ProcessOutcome::Shipped { reserved }) => {
                    order.transition_to(OrderStatus::Shipped)?;
                    if let Err(e) = self.store.update_order(order) {
                        warn!(order_id = %order_id, error = %e, "failed to persist shipment; order left processing");
                        return Err(e);
                    }
                    info!(order_id = %order_id, units = reserved.len(), "order shipped");
                    Ok(ProcessOutcome::Shipped { reserved })
                }
                Ok(shortfall) => {
                    order.transition_to(OrderStatus::Cancelled)?;
                    self.store.update_order(order)?;
                    warn!(order_id = %order_id, outcome = ?shortfall, "order cancelled: insufficient units at processing time");
                    Ok(shortfall)
                }
                Err(e) => {
                    warn!(order_id = %order_id, error = %e, "order processing failed; cancelling");
                    if order.transition_to(OrderStatus::Cancelled).is_ok() {
                        if let Err(update_err) = self.store.update_order(order) {
                            warn!(order_id = %order_id, error = %update_err, "failed to persist cancellation");
                        }
                    }
                    Err(e)
                }
            }
        })
    }

    /// Cancel a `Pending` or `Processing` order, releasing the units reserved
    /// for it (and only those).
    pub fn cancel_order(&self, order_id: OrderId) -> DomainResult<Order> {
        self.order_locks.with_lock(order_id, || -> DomainResult<Order> {
            let mut order = self.load(order_id)?;
            if !order.status().is_cancellable() {
                return Err(DomainError::invalid_transition(
                    order.status(),
                    OrderStatus::Cancelled,
                ));
            }

            let products: Vec<ProductId> = order.lines().keys().copied().collect();
            let released = self.product_locks.with_locks(products, || -> DomainResult<usize> {
                let reserved = self.take_reservations(order_id)?;
                Ok(self.release_units(order_id, &reserved))
            })?;

            order.transition_to(OrderStatus::Cancelled)?;
            self.store.update_order(order.clone())?;
            info!(order_id = %order_id, released, "order cancelled");
            Ok(order)
        })
    }

    /// Complete delivery of a `Shipped` order: its units go through
    /// `InTransit` (leaving their slots) to `Delivered`.
    ///
    /// Units already moved along by an earlier, interrupted attempt are
    /// picked up where they stopped, so a retry after a failure is safe.
    ///
    /// Before anything moves, every requested unit must still be held for
    /// this order: recorded in its ledger entry and not back in stock.
    /// Otherwise `Conflict` is returned and the order stays `Shipped`.
    pub fn deliver_order(&self, order_id: OrderId) -> DomainResult<Order> {
        self.order_locks.with_lock(order_id, || -> DomainResult<Order> {
            let mut order = self.load(order_id)?;
            if order.status() != OrderStatus::Shipped {
                return Err(DomainError::invalid_transition(
                    order.status(),
                    OrderStatus::Delivered,
                ));
            }

            let held = self.held_units(&order)?;
            for unit in held {
                let unit_id = unit.id_typed();
                match unit.status() {
                    UnitStatus::Reserved => {
                        self.units.dispatch(unit_id)?;
                        self.units.transition(unit_id, UnitStatus::Delivered)?;
                    }
                    UnitStatus::InTransit => {
                        self.units.transition(unit_id, UnitStatus::Delivered)?;
                    }
                    UnitStatus::Delivered | UnitStatus::Available => {}
                }
            }

            order.transition_to(OrderStatus::Delivered)?;
            self.store.update_order(order.clone())?;
            self.take_reservations(order_id)?;
            info!(order_id = %order_id, "order delivered");
            Ok(order)
        })
    }

    /// Change a unit's status outside order processing.
    ///
    /// Units recorded in an order's reservation ledger are refused with
    /// `Conflict`; only the engine releases, dispatches or delivers them.
    /// Runs under the unit's product lock so the check cannot race a
    /// reservation being recorded.
    pub fn transition_unit(&self, unit_id: UnitId, next: UnitStatus) -> DomainResult<Unit> {
        let unit = self
            .units
            .get_unit(unit_id)?
            .ok_or_else(|| DomainError::not_found("unit", unit_id))?;
        self.product_locks.with_lock(unit.product_id(), || -> DomainResult<Unit> {
            if let Some(order_id) = self.holder_of(unit_id)? {
                return Err(DomainError::conflict(format!(
                    "unit {unit_id} is reserved for order {order_id}"
                )));
            }
            self.units.transition(unit_id, next)
        })
    }

    /// Order whose ledger entry lists `unit_id`, if any.
    pub fn holder_of(&self, unit_id: UnitId) -> DomainResult<Option<OrderId>> {
        let ledger = self
            .reservations
            .read()
            .map_err(|_| DomainError::storage("reservation ledger lock poisoned"))?;
        Ok(ledger
            .iter()
            .find(|(_, units)| units.contains(&unit_id))
            .map(|(order_id, _)| *order_id))
    }

    /// The order's ledger units, checked to still cover every requested unit
    /// and to be either reserved or already on their way.
    fn held_units(&self, order: &Order) -> DomainResult<Vec<Unit>> {
        let order_id = order.id_typed();
        let ledger = self.reserved_units(order_id)?;
        if (ledger.len() as u64) < order.requested_units() {
            return Err(DomainError::conflict(format!(
                "order {order_id} holds {} of {} requested units",
                ledger.len(),
                order.requested_units()
            )));
        }

        let mut held = Vec::with_capacity(ledger.len());
        for unit_id in ledger {
            let unit = self
                .units
                .get_unit(unit_id)?
                .ok_or_else(|| DomainError::conflict(format!("unit {unit_id} of order {order_id} no longer exists")))?;
            if unit.status() == UnitStatus::Available {
                return Err(DomainError::conflict(format!(
                    "unit {unit_id} of order {order_id} was returned to stock"
                )));
            }
            held.push(unit);
        }
        Ok(held)
    }

    fn load(&self, order_id: OrderId) -> DomainResult<Order> {
        self.store
            .get_order(order_id)?
            .ok_or_else(|| DomainError::not_found("order", order_id))
    }

    /// Reserve every line of `order`, pushing each reserved unit onto
    /// `reserved`. Returns the shortfall outcome for the first line that
    /// cannot be filled. Must run under the order's product locks.
    fn reserve_lines(
        &self,
        order: &Order,
        reserved: &mut Vec<UnitId>,
    ) -> DomainResult<Option<ProcessOutcome>> {
        for (product_id, requested) in order.lines() {
            let mut got = 0u32;
            for unit in self.units.available_units(*product_id)? {
                if got == *requested {
                    break;
                }
                if self.units.try_reserve(unit.id_typed())? {
                    reserved.push(unit.id_typed());
                    got += 1;
                }
            }

            if got < *requested {
                return Ok(Some(ProcessOutcome::Cancelled {
                    product_id: *product_id,
                    requested: *requested,
                    reserved: got,
                }));
            }
        }
        Ok(None)
    }

    /// Best-effort `Reserved -> Available` for each unit; returns how many
    /// were released.
    fn release_units(&self, order_id: OrderId, units: &[UnitId]) -> usize {
        units
            .iter()
            .filter(|unit_id| match self.units.release(**unit_id) {
                Ok(_) => true,
                Err(e) => {
                    warn!(order_id = %order_id, unit_id = %unit_id, error = %e, "failed to release unit");
                    false
                }
            })
            .count()
    }

    /// Record `units` for `order_id`. Each unit was just reserved from
    /// `Available`, so any other entry still listing it is stale and loses it.
    fn record_reservations(&self, order_id: OrderId, units: &[UnitId]) -> DomainResult<()> {
        let mut ledger = self
            .reservations
            .write()
            .map_err(|_| DomainError::storage("reservation ledger lock poisoned"))?;
        for (other, held) in ledger.iter_mut() {
            let before = held.len();
            held.retain(|unit_id| !units.contains(unit_id));
            if held.len() != before {
                warn!(order_id = %other, claimed_by = %order_id, "stale reservations dropped from ledger");
            }
        }
        ledger.insert(order_id, units.to_vec());
        Ok(())
    }

    fn take_reservations(&self, order_id: OrderId) -> DomainResult<Vec<UnitId>> {
        let mut ledger = self
            .reservations
            .write()
            .map_err(|_| DomainError::storage("reservation ledger lock poisoned"))?;
        Ok(ledger.remove(&order_id).unwrap_or_default())
    }
}
