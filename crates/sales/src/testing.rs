//! Fixtures for the fulfillment unit tests, built on the inventory test store.

use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};

use stockroom_core::{CustomerId, Dimensions, DomainError, DomainResult, LocationId, OrderId, ProductId, UnitId};
use stockroom_inventory::testing::{self, VecStore};
use stockroom_inventory::{Location, LocationCategory, LocationStore, Unit, UnitLifecycleManager};

use crate::fulfillment::OrderFulfillmentEngine;
use crate::order::{Order, OrderStatus};
use crate::store::{OrderFilter, OrderStore};

/// Order table carried by the shared test store.
#[derive(Default)]
pub struct OrderTable {
    orders: Mutex<Vec<Order>>,
    /// `update_order` fails with a storage error when the incoming order has
    /// this status.
    pub fail_updates_to: Mutex<Option<OrderStatus>>,
}

pub type Store = VecStore<OrderTable>;

pub type Engine = OrderFulfillmentEngine<Arc<Store>>;

pub struct Fixture {
    pub store: Arc<Store>,
    pub units: Arc<UnitLifecycleManager<Arc<Store>>>,
    pub engine: Engine,
}

pub fn fixture() -> Fixture {
    let store = Arc::new(Store::default());
    let units = Arc::new(UnitLifecycleManager::new(store.clone()));
    let engine = OrderFulfillmentEngine::new(store.clone(), units.clone());
    Fixture {
        store,
        units,
        engine,
    }
}

impl Fixture {
    pub fn product(&self, price: u64) -> ProductId {
        testing::add_priced_product(&self.store, price, Dimensions::new(1.0, 1.0, 1.0).unwrap())
    }

    /// `count` placed, available units of `product_id`.
    pub fn stock(&self, product_id: ProductId, count: usize) -> Vec<UnitId> {
        (0..count)
            .map(|_| {
                let location_id = LocationId::new();
                let dims = Dimensions::new(10.0, 10.0, 10.0).unwrap();
                self.store
                    .insert_location(Location::new(location_id, LocationCategory::Small, dims))
                    .unwrap();
                let unit = Unit::new(UnitId::new(), product_id);
                self.units
                    .create_unit(unit, Some(location_id))
                    .unwrap()
                    .id_typed()
            })
            .collect()
    }

    pub fn order(&self, customer_id: CustomerId, lines: &[(ProductId, u32)]) -> Order {
        self.order_at(customer_id, lines, 0)
    }

    /// Order created `minutes` after a fixed epoch.
    pub fn order_at(&self, customer_id: CustomerId, lines: &[(ProductId, u32)], minutes: i64) -> Order {
        let epoch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let order = Order::new(
            OrderId::new(),
            customer_id,
            lines.iter().copied().collect(),
            epoch + Duration::minutes(minutes),
        )
        .unwrap();
        self.engine.create_order(order).unwrap()
    }

    pub fn fail_order_updates_to(&self, status: Option<OrderStatus>) {
        *self.store.tables.fail_updates_to.lock().unwrap() = status;
    }
}

impl OrderStore for Store {
    fn get_order(&self, id: OrderId) -> DomainResult<Option<Order>> {
        let orders = self.tables.orders.lock().unwrap();
        Ok(orders.iter().find(|o| o.id_typed() == id).cloned())
    }

    fn insert_order(&self, order: Order) -> DomainResult<()> {
        self.tables.orders.lock().unwrap().push(order);
        Ok(())
    }

    fn update_order(&self, order: Order) -> DomainResult<()> {
        if *self.tables.fail_updates_to.lock().unwrap() == Some(order.status()) {
            return Err(DomainError::storage("order table unavailable"));
        }
        let mut orders = self.tables.orders.lock().unwrap();
        let slot = orders
            .iter_mut()
            .find(|o| o.id_typed() == order.id_typed())
            .ok_or_else(|| DomainError::not_found("order", order.id_typed()))?;
        *slot = order;
        Ok(())
    }

    fn list_orders(&self, filter: &OrderFilter) -> DomainResult<Vec<Order>> {
        let orders = self.tables.orders.lock().unwrap();
        Ok(orders.iter().filter(|o| filter.matches(o)).cloned().collect())
    }
}
