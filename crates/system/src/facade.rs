//! Inventory system facade.
//!
//! Mutating operations return `bool`: failures are logged with the operation
//! name and swallowed. Reads return `DomainResult` so callers can tell an
//! empty answer from a storage failure.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error, info, warn};

use stockroom_core::{CustomerId, DomainError, DomainResult, LocationId, OrderId, ProductId, UnitId};
use stockroom_infra::{EngineConfig, InMemoryStorage};
use stockroom_inventory::{
    Location, LocationCategory, LocationFilter, LocationStore, PlacementStrategy, Unit,
    UnitFilter, UnitLifecycleManager, UnitStatus, UnitStore,
};
use stockroom_products::{Product, ProductCatalog};
use stockroom_sales::{Order, OrderFulfillmentEngine, OrderStatus, OrderStore, ProcessOutcome};

use crate::report::InventoryReport;

#[derive(Debug)]
pub struct InventorySystem<S> {
    store: S,
    units: Arc<UnitLifecycleManager<S>>,
    orders: OrderFulfillmentEngine<S>,
    strategy: RwLock<PlacementStrategy>,
    placement_attempts: u32,
}

impl InventorySystem<Arc<InMemoryStorage>> {
    pub fn in_memory(config: &EngineConfig) -> Self {
        Self::new(InMemoryStorage::shared(), config)
    }
}

impl<S> InventorySystem<S>
where
    S: ProductCatalog + LocationStore + UnitStore + OrderStore + Clone,
{
    pub fn new(store: S, config: &EngineConfig) -> Self {
        let units = Arc::new(UnitLifecycleManager::new(store.clone()));
        let orders = OrderFulfillmentEngine::new(store.clone(), Arc::clone(&units));
        Self {
            store,
            units,
            orders,
            strategy: RwLock::new(config.placement_strategy),
            placement_attempts: config.placement_attempts.max(1),
        }
    }

    pub fn orders(&self) -> &OrderFulfillmentEngine<S> {
        &self.orders
    }

    // ---- placement strategy ----

    pub fn location_strategy(&self) -> PlacementStrategy {
        *self.strategy.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swap the strategy used for future placements. Units already placed stay
    /// where they are.
    pub fn set_location_strategy(&self, strategy: PlacementStrategy) {
        let mut current = self.strategy.write().unwrap_or_else(PoisonError::into_inner);
        let previous = *current;
        if previous != strategy {
            *current = strategy;
            info!(from = %previous, to = %strategy, "placement strategy changed");
        }
    }

    // ---- products ----

    pub fn add_product(&self, product: Product) -> bool {
        let product_id = product.id_typed();
        succeeded("add_product", self.store.insert_product(product).map(|()| {
            info!(product_id = %product_id, "product added");
        }))
    }

    /// Full replacement of an existing product.
    pub fn update_product(&self, product: Product) -> bool {
        succeeded("update_product", self.store.update_product(product))
    }

    /// Refused while any unit of the product exists.
    pub fn delete_product(&self, product_id: ProductId) -> bool {
        succeeded("delete_product", self.try_delete_product(product_id))
    }

    fn try_delete_product(&self, product_id: ProductId) -> DomainResult<()> {
        let units = self.store.count_units(&UnitFilter::product(product_id))?;
        if units > 0 {
            return Err(DomainError::conflict(format!(
                "product {product_id} still has {units} units"
            )));
        }
        if !self.store.delete_product(product_id)? {
            return Err(DomainError::not_found("product", product_id));
        }
        info!(product_id = %product_id, "product deleted");
        Ok(())
    }

    pub fn get_product(&self, product_id: ProductId) -> DomainResult<Option<Product>> {
        self.store.get_product(product_id)
    }

    pub fn list_products(&self) -> DomainResult<Vec<Product>> {
        self.store.list_products()
    }

    /// Products whose name contains `query`, ignoring case.
    pub fn search_products(&self, query: &str) -> DomainResult<Vec<Product>> {
        let needle = query.to_lowercase();
        Ok(self
            .store
            .list_products()?
            .into_iter()
            .filter(|p| p.name().to_lowercase().contains(&needle))
            .collect())
    }

    // ---- locations ----

    /// New locations must arrive vacant; only placing a unit occupies one.
    pub fn add_location(&self, location: Location) -> bool {
        succeeded("add_location", self.try_add_location(location))
    }

    fn try_add_location(&self, location: Location) -> DomainResult<()> {
        let location_id = location.id_typed();
        if location.is_occupied() {
            return Err(DomainError::validation(format!(
                "location {location_id} is marked occupied but holds no unit"
            )));
        }
        self.store.insert_location(location)?;
        info!(location_id = %location_id, "location added");
        Ok(())
    }

    pub fn get_location(&self, location_id: LocationId) -> DomainResult<Option<Location>> {
        self.store.get_location(location_id)
    }

    pub fn list_locations(&self) -> DomainResult<Vec<Location>> {
        self.store.list_locations(&LocationFilter::default())
    }

    pub fn available_locations(&self) -> DomainResult<Vec<Location>> {
        self.store.list_locations(&LocationFilter::available())
    }

    pub fn locations_by_category(&self, category: LocationCategory) -> DomainResult<Vec<Location>> {
        self.store.list_locations(&LocationFilter::category(category))
    }

    /// Location the active strategy would pick for `product_id` right now.
    /// Nothing is reserved; a later placement may still lose the race.
    pub fn find_suitable_location(&self, product_id: ProductId) -> DomainResult<Option<Location>> {
        let product = self
            .store
            .get_product(product_id)?
            .ok_or_else(|| DomainError::not_found("product", product_id))?;
        self.select_location(&product)
    }

    fn select_location(&self, product: &Product) -> DomainResult<Option<Location>> {
        let strategy = self.location_strategy();
        let candidates = self.available_locations()?;
        let selected = strategy.select(product, &candidates).cloned();
        debug!(
            product_id = %product.id_typed(),
            strategy = %strategy,
            candidates = candidates.len(),
            selected = ?selected.as_ref().map(Location::id_typed),
            "location selected"
        );
        Ok(selected)
    }

    // ---- units ----

    /// Create `unit` in a location chosen by the active strategy.
    ///
    /// Fails when the product is unknown or no location fits. Selection is
    /// re-run when the chosen location is taken before it can be occupied.
    pub fn add_unit(&self, unit: Unit) -> bool {
        succeeded("add_unit", self.place_new_unit(unit))
    }

    fn place_new_unit(&self, unit: Unit) -> DomainResult<Unit> {
        let product = self
            .store
            .get_product(unit.product_id())?
            .ok_or_else(|| DomainError::not_found("product", unit.product_id()))?;

        self.with_placement_retries(&product, |location_id| {
            self.units.create_unit(unit.clone(), Some(location_id))
        })
    }

    /// Run `place` against successive strategy selections until it stops
    /// failing with `LocationUnavailable` or attempts run out.
    fn with_placement_retries(
        &self,
        product: &Product,
        mut place: impl FnMut(LocationId) -> DomainResult<Unit>,
    ) -> DomainResult<Unit> {
        let mut last_err = None;
        for attempt in 1..=self.placement_attempts {
            let Some(location) = self.select_location(product)? else {
                return Err(DomainError::validation(format!(
                    "no available location fits product {}",
                    product.id_typed()
                )));
            };
            match place(location.id_typed()) {
                Err(e @ DomainError::LocationUnavailable(_)) => {
                    debug!(attempt, location_id = %location.id_typed(), "selected location taken; retrying");
                    last_err = Some(e);
                }
                other => return other,
            }
        }
        Err(last_err.unwrap_or_else(|| DomainError::validation("no placement attempts configured")))
    }

    /// Refused while the unit is reserved for, travelling to, or still
    /// recorded against an order.
    pub fn remove_unit(&self, unit_id: UnitId) -> bool {
        succeeded(
            "remove_unit",
            self.ensure_unclaimed(unit_id)
                .and_then(|()| self.units.remove_unit(unit_id)),
        )
    }

    pub fn relocate_unit(&self, unit_id: UnitId, location_id: LocationId) -> bool {
        succeeded("relocate_unit", self.units.relocate(unit_id, location_id))
    }

    /// Return a delivered unit to stock and, if some location fits, shelve it.
    /// A unit with nowhere to go stays available but unplaced.
    pub fn restock_unit(&self, unit_id: UnitId) -> bool {
        succeeded("restock_unit", self.try_restock(unit_id))
    }

    fn try_restock(&self, unit_id: UnitId) -> DomainResult<Unit> {
        self.ensure_unclaimed(unit_id)?;
        let unit = self.units.restock(unit_id)?;
        let product = self
            .store
            .get_product(unit.product_id())?
            .ok_or_else(|| DomainError::not_found("product", unit.product_id()))?;

        match self.with_placement_retries(&product, |location_id| {
            self.units.relocate(unit_id, location_id)
        }) {
            Ok(placed) => Ok(placed),
            Err(e) if !matches!(e, DomainError::Storage(_)) => {
                warn!(unit_id = %unit_id, error = %e, "restocked unit left unplaced");
                Ok(unit)
            }
            Err(e) => Err(e),
        }
    }

    /// Units held in an order's reservation ledger are refused; orders move
    /// them through processing, cancellation and delivery.
    pub fn transition_unit(&self, unit_id: UnitId, next: UnitStatus) -> bool {
        succeeded("transition_unit", self.orders.transition_unit(unit_id, next))
    }

    fn ensure_unclaimed(&self, unit_id: UnitId) -> DomainResult<()> {
        match self.orders.holder_of(unit_id)? {
            Some(order_id) => Err(DomainError::conflict(format!(
                "unit {unit_id} is still recorded against order {order_id}"
            ))),
            None => Ok(()),
        }
    }

    pub fn get_unit(&self, unit_id: UnitId) -> DomainResult<Option<Unit>> {
        self.units.get_unit(unit_id)
    }

    pub fn list_units(
        &self,
        product_id: Option<ProductId>,
        status: Option<UnitStatus>,
    ) -> DomainResult<Vec<Unit>> {
        self.units.list_units(&UnitFilter { product_id, status })
    }

    pub fn available_units(&self, product_id: ProductId) -> DomainResult<Vec<Unit>> {
        self.units.available_units(product_id)
    }

    // ---- orders ----

    pub fn place_order(&self, order: Order) -> bool {
        succeeded("place_order", self.orders.create_order(order))
    }

    /// `true` only when the order shipped.
    pub fn process_order(&self, order_id: OrderId) -> bool {
        match self.orders.process_order(order_id) {
            Ok(ProcessOutcome::Shipped { .. }) => true,
            Ok(ProcessOutcome::Cancelled { .. }) => false,
            Err(e) => {
                log_failure("process_order", &e);
                false
            }
        }
    }

    pub fn cancel_order(&self, order_id: OrderId) -> bool {
        succeeded("cancel_order", self.orders.cancel_order(order_id))
    }

    pub fn deliver_order(&self, order_id: OrderId) -> bool {
        succeeded("deliver_order", self.orders.deliver_order(order_id))
    }

    pub fn get_order(&self, order_id: OrderId) -> DomainResult<Option<Order>> {
        self.orders.get_order(order_id)
    }

    pub fn list_orders(&self, status: Option<OrderStatus>) -> DomainResult<Vec<Order>> {
        self.orders.list_orders(status)
    }

    pub fn order_history(&self, customer_id: CustomerId) -> DomainResult<Vec<Order>> {
        self.orders.order_history(customer_id)
    }

    // ---- reporting ----

    pub fn generate_report(&self) -> DomainResult<InventoryReport> {
        InventoryReport::collect(&self.store)
    }
}

fn succeeded<T>(operation: &'static str, result: DomainResult<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            log_failure(operation, &e);
            false
        }
    }
}

fn log_failure(operation: &'static str, e: &DomainError) {
    match e {
        DomainError::Storage(_) => error!(operation, error = %e, "operation failed"),
        _ => warn!(operation, error = %e, "operation refused"),
    }
}
