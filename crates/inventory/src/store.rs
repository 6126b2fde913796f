//! Storage ports for locations and units.
//!
//! Listings return records in a stable order (insertion order for the
//! in-memory collaborator). Placement strategies and unit selection depend on
//! that order being repeatable.

use std::sync::Arc;

use stockroom_core::{DomainResult, LocationId, ProductId, UnitId};

use crate::location::{Location, LocationCategory};
use crate::unit::{Unit, UnitStatus};

/// Equality filter over locations. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocationFilter {
    pub occupied: Option<bool>,
    pub category: Option<LocationCategory>,
}

impl LocationFilter {
    pub fn available() -> Self {
        Self {
            occupied: Some(false),
            category: None,
        }
    }

    pub fn category(category: LocationCategory) -> Self {
        Self {
            occupied: None,
            category: Some(category),
        }
    }

    pub fn matches(&self, location: &Location) -> bool {
        self.occupied.is_none_or(|o| location.is_occupied() == o)
            && self.category.is_none_or(|c| location.category() == c)
    }
}

/// Equality filter over units. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitFilter {
    pub product_id: Option<ProductId>,
    pub status: Option<UnitStatus>,
}

impl UnitFilter {
    pub fn product(product_id: ProductId) -> Self {
        Self {
            product_id: Some(product_id),
            status: None,
        }
    }

    pub fn available(product_id: ProductId) -> Self {
        Self {
            product_id: Some(product_id),
            status: Some(UnitStatus::Available),
        }
    }

    pub fn status(status: UnitStatus) -> Self {
        Self {
            product_id: None,
            status: Some(status),
        }
    }

    pub fn matches(&self, unit: &Unit) -> bool {
        self.product_id.is_none_or(|p| unit.product_id() == p)
            && self.status.is_none_or(|s| unit.status() == s)
    }
}

pub trait LocationStore: Send + Sync {
    fn get_location(&self, id: LocationId) -> DomainResult<Option<Location>>;
    /// Insert a new location; an existing id is a `Conflict`.
    fn insert_location(&self, location: Location) -> DomainResult<()>;
    /// Replace an existing location; a missing id is `NotFound`.
    fn update_location(&self, location: Location) -> DomainResult<()>;
    fn list_locations(&self, filter: &LocationFilter) -> DomainResult<Vec<Location>>;
}

pub trait UnitStore: Send + Sync {
    fn get_unit(&self, id: UnitId) -> DomainResult<Option<Unit>>;
    /// Insert a new unit; an existing id is a `Conflict`.
    fn insert_unit(&self, unit: Unit) -> DomainResult<()>;
    /// Replace an existing unit; a missing id is `NotFound`.
    fn update_unit(&self, unit: Unit) -> DomainResult<()>;
    /// Returns `false` when the id was unknown.
    fn delete_unit(&self, id: UnitId) -> DomainResult<bool>;
    fn list_units(&self, filter: &UnitFilter) -> DomainResult<Vec<Unit>>;

    fn count_units(&self, filter: &UnitFilter) -> DomainResult<usize> {
        Ok(self.list_units(filter)?.len())
    }
}

impl<S> LocationStore for Arc<S>
where
    S: LocationStore + ?Sized,
{
    fn get_location(&self, id: LocationId) -> DomainResult<Option<Location>> {
        (**self).get_location(id)
    }

    fn insert_location(&self, location: Location) -> DomainResult<()> {
        (**self).insert_location(location)
    }

    fn update_location(&self, location: Location) -> DomainResult<()> {
        (**self).update_location(location)
    }

    fn list_locations(&self, filter: &LocationFilter) -> DomainResult<Vec<Location>> {
        (**self).list_locations(filter)
    }
}

impl<S> UnitStore for Arc<S>
where
    S: UnitStore + ?Sized,
{
    fn get_unit(&self, id: UnitId) -> DomainResult<Option<Unit>> {
        (**self).get_unit(id)
    }

    fn insert_unit(&self, unit: Unit) -> DomainResult<()> {
        (**self).insert_unit(unit)
    }

    fn update_unit(&self, unit: Unit) -> DomainResult<()> {
        (**self).update_unit(unit)
    }

    fn delete_unit(&self, id: UnitId) -> DomainResult<bool> {
        (**self).delete_unit(id)
    }

    fn list_units(&self, filter: &UnitFilter) -> DomainResult<Vec<Unit>> {
        (**self).list_units(filter)
    }

    fn count_units(&self, filter: &UnitFilter) -> DomainResult<usize> {
        (**self).count_units(filter)
    }
}
