//! Vec-backed store for unit tests here and in downstream crates.
//!
//! Enabled for this crate's tests and, through the `testing` feature, for
//! crates that build on the inventory ports.

use std::sync::{Arc, Mutex};

use stockroom_core::{Dimensions, DomainError, DomainResult, LocationId, ProductId, UnitId};
use stockroom_products::{Product, ProductCatalog};

use crate::location::{Location, LocationCategory};
use crate::store::{LocationFilter, LocationStore, UnitFilter, UnitStore};
use crate::unit::Unit;

/// Vec-backed tables; listing order is insertion order.
///
/// `T` holds whatever extra tables a downstream crate implements its own
/// ports over.
#[derive(Default)]
pub struct VecStore<T = ()> {
    products: Mutex<Vec<Product>>,
    locations: Mutex<Vec<Location>>,
    units: Mutex<Vec<Unit>>,
    /// When set, `insert_unit` fails with a storage error.
    pub fail_unit_inserts: Mutex<bool>,
    /// When set, `update_unit` fails with a storage error.
    pub fail_unit_updates: Mutex<bool>,
    pub tables: T,
}

pub fn store() -> Arc<VecStore> {
    Arc::new(VecStore::default())
}

pub fn add_product<T: Send + Sync>(store: &VecStore<T>, l: f64, w: f64, h: f64) -> ProductId {
    add_priced_product(store, 250, Dimensions::new(l, w, h).unwrap())
}

pub fn add_priced_product<T: Send + Sync>(
    store: &VecStore<T>,
    unit_price: u64,
    dimensions: Dimensions,
) -> ProductId {
    let id = ProductId::new();
    let product = Product::new(id, "widget", "", unit_price, 1.0, dimensions).unwrap();
    store.insert_product(product).unwrap();
    id
}

pub fn add_location<T: Send + Sync>(store: &VecStore<T>, l: f64, w: f64, h: f64) -> LocationId {
    let id = LocationId::new();
    let location = Location::new(id, LocationCategory::Medium, Dimensions::new(l, w, h).unwrap());
    store.insert_location(location).unwrap();
    id
}

impl<T: Send + Sync> ProductCatalog for VecStore<T> {
    fn get_product(&self, id: ProductId) -> DomainResult<Option<Product>> {
        Ok(self.products.lock().unwrap().iter().find(|p| p.id_typed() == id).cloned())
    }

    fn insert_product(&self, product: Product) -> DomainResult<()> {
        self.products.lock().unwrap().push(product);
        Ok(())
    }

    fn update_product(&self, product: Product) -> DomainResult<()> {
        let mut products = self.products.lock().unwrap();
        let slot = products
            .iter_mut()
            .find(|p| p.id_typed() == product.id_typed())
            .ok_or_else(|| DomainError::not_found("product", product.id_typed()))?;
        *slot = product;
        Ok(())
    }

    fn delete_product(&self, id: ProductId) -> DomainResult<bool> {
        let mut products = self.products.lock().unwrap();
        let before = products.len();
        products.retain(|p| p.id_typed() != id);
        Ok(products.len() != before)
    }

    fn list_products(&self) -> DomainResult<Vec<Product>> {
        Ok(self.products.lock().unwrap().clone())
    }
}

impl<T: Send + Sync> LocationStore for VecStore<T> {
    fn get_location(&self, id: LocationId) -> DomainResult<Option<Location>> {
        Ok(self.locations.lock().unwrap().iter().find(|l| l.id_typed() == id).cloned())
    }

    fn insert_location(&self, location: Location) -> DomainResult<()> {
        self.locations.lock().unwrap().push(location);
        Ok(())
    }

    fn update_location(&self, location: Location) -> DomainResult<()> {
        let mut locations = self.locations.lock().unwrap();
        let slot = locations
            .iter_mut()
            .find(|l| l.id_typed() == location.id_typed())
            .ok_or_else(|| DomainError::not_found("location", location.id_typed()))?;
        *slot = location;
        Ok(())
    }

    fn list_locations(&self, filter: &LocationFilter) -> DomainResult<Vec<Location>> {
        Ok(self
            .locations
            .lock()
            .unwrap()
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect())
    }
}

impl<T: Send + Sync> UnitStore for VecStore<T> {
    fn get_unit(&self, id: UnitId) -> DomainResult<Option<Unit>> {
        Ok(self.units.lock().unwrap().iter().find(|u| u.id_typed() == id).cloned())
    }

    fn insert_unit(&self, unit: Unit) -> DomainResult<()> {
        if *self.fail_unit_inserts.lock().unwrap() {
            return Err(DomainError::storage("unit table unavailable"));
        }
        self.units.lock().unwrap().push(unit);
        Ok(())
    }

    fn update_unit(&self, unit: Unit) -> DomainResult<()> {
        if *self.fail_unit_updates.lock().unwrap() {
            return Err(DomainError::storage("unit table unavailable"));
        }
        let mut units = self.units.lock().unwrap();
        let slot = units
            .iter_mut()
            .find(|u| u.id_typed() == unit.id_typed())
            .ok_or_else(|| DomainError::not_found("unit", unit.id_typed()))?;
        *slot = unit;
        Ok(())
    }

    fn delete_unit(&self, id: UnitId) -> DomainResult<bool> {
        let mut units = self.units.lock().unwrap();
        let before = units.len();
        units.retain(|u| u.id_typed() != id);
        Ok(units.len() != before)
    }

    fn list_units(&self, filter: &UnitFilter) -> DomainResult<Vec<Unit>> {
        Ok(self
            .units
            .lock()
            .unwrap()
            .iter()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect())
    }
}
