//! In-memory storage collaborator.
//!
//! One [`InMemoryTable`] per entity type. Listings come back in insertion
//! order, which is the scan order the fulfillment engine and the placement
//! strategies see.

mod table;

pub use table::InMemoryTable;

use std::sync::Arc;

use stockroom_core::{DomainResult, LocationId, OrderId, ProductId, UnitId};
use stockroom_inventory::{Location, LocationFilter, LocationStore, Unit, UnitFilter, UnitStore};
use stockroom_products::{Product, ProductCatalog};
use stockroom_sales::{Order, OrderFilter, OrderStore};

#[derive(Debug, Default)]
pub struct InMemoryStorage {
    products: InMemoryTable<Product>,
    locations: InMemoryTable<Location>,
    units: InMemoryTable<Unit>,
    orders: InMemoryTable<Order>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl ProductCatalog for InMemoryStorage {
    fn get_product(&self, id: ProductId) -> DomainResult<Option<Product>> {
        self.products.get(&id)
    }

    fn insert_product(&self, product: Product) -> DomainResult<()> {
        self.products.insert(product)
    }

    fn update_product(&self, product: Product) -> DomainResult<()> {
        self.products.update(product)
    }

    fn delete_product(&self, id: ProductId) -> DomainResult<bool> {
        self.products.delete(&id)
    }

    fn list_products(&self) -> DomainResult<Vec<Product>> {
        self.products.list(|_| true)
    }
}

impl LocationStore for InMemoryStorage {
    fn get_location(&self, id: LocationId) -> DomainResult<Option<Location>> {
        self.locations.get(&id)
    }

    fn insert_location(&self, location: Location) -> DomainResult<()> {
        self.locations.insert(location)
    }

    fn update_location(&self, location: Location) -> DomainResult<()> {
        self.locations.update(location)
    }

    fn list_locations(&self, filter: &LocationFilter) -> DomainResult<Vec<Location>> {
        self.locations.list(|l| filter.matches(l))
    }
}

impl UnitStore for InMemoryStorage {
    fn get_unit(&self, id: UnitId) -> DomainResult<Option<Unit>> {
        self.units.get(&id)
    }

    fn insert_unit(&self, unit: Unit) -> DomainResult<()> {
        self.units.insert(unit)
    }

    fn update_unit(&self, unit: Unit) -> DomainResult<()> {
        self.units.update(unit)
    }

    fn delete_unit(&self, id: UnitId) -> DomainResult<bool> {
        self.units.delete(&id)
    }

    fn list_units(&self, filter: &UnitFilter) -> DomainResult<Vec<Unit>> {
        self.units.list(|u| filter.matches(u))
    }

    fn count_units(&self, filter: &UnitFilter) -> DomainResult<usize> {
        self.units.count(|u| filter.matches(u))
    }
}

impl OrderStore for InMemoryStorage {
    fn get_order(&self, id: OrderId) -> DomainResult<Option<Order>> {
        self.orders.get(&id)
    }

    fn insert_order(&self, order: Order) -> DomainResult<()> {
        self.orders.insert(order)
    }

    fn update_order(&self, order: Order) -> DomainResult<()> {
        self.orders.update(order)
    }

    fn list_orders(&self, filter: &OrderFilter) -> DomainResult<Vec<Order>> {
        self.orders.list(|o| filter.matches(o))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockroom_core::{CustomerId, Dimensions, DomainError};
    use stockroom_inventory::{LocationCategory, UnitStatus};
    use stockroom_sales::OrderStatus;

    fn location(category: LocationCategory) -> Location {
        Location::new(
            LocationId::new(),
            category,
            Dimensions::new(2.0, 2.0, 2.0).unwrap(),
        )
    }

    #[test]
    fn locations_filter_by_category_in_insertion_order() {
        let storage = InMemoryStorage::new();
        let small_a = location(LocationCategory::Small);
        let large = location(LocationCategory::Large);
        let small_b = location(LocationCategory::Small);
        for loc in [&small_a, &large, &small_b] {
            storage.insert_location(loc.clone()).unwrap();
        }

        let small: Vec<LocationId> = storage
            .list_locations(&LocationFilter::category(LocationCategory::Small))
            .unwrap()
            .iter()
            .map(Location::id_typed)
            .collect();
        assert_eq!(small, vec![small_a.id_typed(), small_b.id_typed()]);
        assert_eq!(storage.list_locations(&LocationFilter::available()).unwrap().len(), 3);
    }

    #[test]
    fn units_filter_by_product_and_status() {
        let storage = InMemoryStorage::new();
        let product = ProductId::new();
        let mut reserved = Unit::new(UnitId::new(), product);
        reserved.transition_to(UnitStatus::Reserved).unwrap();
        storage.insert_unit(Unit::new(UnitId::new(), product)).unwrap();
        storage.insert_unit(reserved).unwrap();
        storage.insert_unit(Unit::new(UnitId::new(), ProductId::new())).unwrap();

        assert_eq!(storage.count_units(&UnitFilter::product(product)).unwrap(), 2);
        assert_eq!(storage.count_units(&UnitFilter::available(product)).unwrap(), 1);
        assert_eq!(
            storage
                .list_units(&UnitFilter::status(UnitStatus::Reserved))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn orders_filter_by_status_and_customer() {
        let storage = InMemoryStorage::new();
        let customer = CustomerId::new();
        let make = |customer_id| {
            Order::new(
                OrderId::new(),
                customer_id,
                [(ProductId::new(), 1)].into(),
                Utc::now(),
            )
            .unwrap()
        };
        let mut cancelled = make(customer);
        cancelled.transition_to(OrderStatus::Cancelled).unwrap();
        storage.insert_order(make(customer)).unwrap();
        storage.insert_order(cancelled).unwrap();
        storage.insert_order(make(CustomerId::new())).unwrap();

        assert_eq!(storage.list_orders(&OrderFilter::customer(customer)).unwrap().len(), 2);
        assert_eq!(
            storage
                .list_orders(&OrderFilter::status(OrderStatus::Pending))
                .unwrap()
                .len(),
            2
        );
        let both = OrderFilter {
            status: Some(OrderStatus::Cancelled),
            customer_id: Some(customer),
        };
        assert_eq!(storage.list_orders(&both).unwrap().len(), 1);
    }

    #[test]
    fn product_crud_round_trip() {
        let storage = InMemoryStorage::shared();
        let id = ProductId::new();
        let dims = Dimensions::new(1.0, 2.0, 3.0).unwrap();
        let product = Product::new(id, "Crate", "", 500, 2.5, dims).unwrap();
        storage.insert_product(product.clone()).unwrap();
        assert!(matches!(
            storage.insert_product(product),
            Err(DomainError::Conflict(_))
        ));

        let renamed = Product::new(id, "Big crate", "", 900, 2.5, dims).unwrap();
        storage.update_product(renamed).unwrap();
        assert_eq!(storage.get_product(id).unwrap().unwrap().unit_price(), 900);

        assert!(storage.delete_product(id).unwrap());
        assert!(storage.list_products().unwrap().is_empty());
    }
}
