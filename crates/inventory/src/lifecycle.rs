//! Unit lifecycle: creation, placement, status transitions, removal.
//!
//! Every mutation of a unit runs under that unit's lock, so a status
//! compare-and-swap (e.g. `Available -> Reserved`) cannot interleave with a
//! relocation or removal of the same unit. Location locks are only ever taken
//! while a unit lock is held, never the other way round.

use tracing::{info, warn};

use stockroom_core::{DomainError, DomainResult, LocationId, LockTable, ProductId, UnitId};
use stockroom_products::ProductCatalog;

use crate::allocator::LocationAllocator;
use crate::store::{LocationStore, UnitFilter, UnitStore};
use crate::unit::{Unit, UnitStatus};

#[derive(Debug)]
pub struct UnitLifecycleManager<S> {
    store: S,
    allocator: LocationAllocator<S>,
    locks: LockTable<UnitId>,
}

impl<S> UnitLifecycleManager<S>
where
    S: UnitStore + LocationStore + ProductCatalog + Clone,
{
    pub fn new(store: S) -> Self {
        Self {
            allocator: LocationAllocator::new(store.clone()),
            store,
            locks: LockTable::new(),
        }
    }

    pub fn allocator(&self) -> &LocationAllocator<S> {
        &self.allocator
    }

    pub fn get_unit(&self, id: UnitId) -> DomainResult<Option<Unit>> {
        self.store.get_unit(id)
    }

    pub fn list_units(&self, filter: &UnitFilter) -> DomainResult<Vec<Unit>> {
        self.store.list_units(filter)
    }

    /// Available units of a product, in the store's scan order.
    pub fn available_units(&self, product_id: ProductId) -> DomainResult<Vec<Unit>> {
        self.store.list_units(&UnitFilter::available(product_id))
    }

    pub fn count_available(&self, product_id: ProductId) -> DomainResult<usize> {
        self.store.count_units(&UnitFilter::available(product_id))
    }

    /// Persist a new unit, optionally occupying `target` for it first.
    ///
    /// Fails with `NotFound` for an unknown product and `LocationUnavailable`
    /// when `target` is already occupied. If the insert itself fails the
    /// occupied location is vacated again.
    pub fn create_unit(&self, unit: Unit, target: Option<LocationId>) -> DomainResult<Unit> {
        if unit.status() != UnitStatus::Available || unit.location_id().is_some() {
            return Err(DomainError::validation(
                "new units must be available and not yet placed",
            ));
        }

        let unit_id = unit.id_typed();
        self.locks.with_lock(unit_id, || -> DomainResult<Unit> {
            if self.store.get_product(unit.product_id())?.is_none() {
                return Err(DomainError::not_found("product", unit.product_id()));
            }
            if self.store.get_unit(unit_id)?.is_some() {
                return Err(DomainError::conflict(format!("unit {unit_id} already exists")));
            }

            let mut unit = unit;
            if let Some(location_id) = target {
                if !self.allocator.occupy(location_id)? {
                    return Err(DomainError::location_unavailable(location_id));
                }
                unit.set_location(Some(location_id));
            }

            if let Err(e) = self.store.insert_unit(unit.clone()) {
                if let Some(location_id) = target {
                    warn!(unit_id = %unit_id, location_id = %location_id, error = %e, "unit insert failed; vacating location");
                    self.allocator.vacate(location_id)?;
                }
                return Err(e);
            }

            info!(
                unit_id = %unit_id,
                product_id = %unit.product_id(),
                location_id = ?unit.location_id(),
                "unit created"
            );
            Ok(unit)
        })
    }

    /// Move an available unit to `new_location`.
    ///
    /// The old location is vacated first and stays vacated even when the new
    /// one turns out to be taken; in that case the unit is left unplaced
    /// (location cleared) and `LocationUnavailable` is returned.
    pub fn relocate(&self, unit_id: UnitId, new_location: LocationId) -> DomainResult<Unit> {
        self.locks.with_lock(unit_id, || -> DomainResult<Unit> {
            let mut unit = self.load(unit_id)?;
            if unit.status() != UnitStatus::Available {
                return Err(DomainError::InvalidTransition(format!(
                    "unit {unit_id} is {:?}; only available units can be relocated",
                    unit.status()
                )));
            }

            if let Some(old) = unit.location_id() {
                if !self.allocator.vacate(old)? {
                    warn!(unit_id = %unit_id, location_id = %old, "previous location was already vacant");
                }
            }

            let occupied = self.allocator.occupy(new_location);
            if let Ok(true) = occupied {
                unit.set_location(Some(new_location));
                self.store.update_unit(unit.clone())?;
                info!(unit_id = %unit_id, location_id = %new_location, "unit relocated");
                return Ok(unit);
            }

            unit.set_location(None);
            self.store.update_unit(unit)?;
            warn!(unit_id = %unit_id, location_id = %new_location, "relocation failed; unit left unplaced");
            match occupied {
                Err(e) => Err(e),
                _ => Err(DomainError::location_unavailable(new_location)),
            }
        })
    }

    /// Delete a unit and free its location.
    ///
    /// Units that are reserved or in transit belong to an order and are
    /// refused with `InvalidTransition`. The record is deleted before the
    /// location is vacated; if vacating fails the record is restored.
    pub fn remove_unit(&self, unit_id: UnitId) -> DomainResult<Unit> {
        self.locks.with_lock(unit_id, || -> DomainResult<Unit> {
            let unit = self.load(unit_id)?;
            if unit.status().is_committed_to_order() {
                return Err(DomainError::InvalidTransition(format!(
                    "unit {unit_id} is {:?} and cannot be removed",
                    unit.status()
                )));
            }

            if !self.store.delete_unit(unit_id)? {
                return Err(DomainError::not_found("unit", unit_id));
            }

            if let Some(location_id) = unit.location_id() {
                match self.allocator.vacate(location_id) {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!(unit_id = %unit_id, location_id = %location_id, "removed unit's location was already vacant");
                    }
                    Err(e) => {
                        self.store.insert_unit(unit.clone())?;
                        return Err(e);
                    }
                }
            }

            info!(unit_id = %unit_id, "unit removed");
            Ok(unit)
        })
    }

    /// Apply a validated status transition. Moving to `InTransit` goes
    /// through [`dispatch`](Self::dispatch) so the unit's slot is freed.
    pub fn transition(&self, unit_id: UnitId, next: UnitStatus) -> DomainResult<Unit> {
        if next == UnitStatus::InTransit {
            return self.dispatch(unit_id);
        }
        self.locks.with_lock(unit_id, || -> DomainResult<Unit> {
            let mut unit = self.load(unit_id)?;
            unit.transition_to(next)?;
            self.store.update_unit(unit.clone())?;
            Ok(unit)
        })
    }

    /// Compare-and-swap `Available -> Reserved`.
    ///
    /// `Ok(false)` when the unit is gone or no longer available.
    pub fn try_reserve(&self, unit_id: UnitId) -> DomainResult<bool> {
        self.locks.with_lock(unit_id, || -> DomainResult<bool> {
            let Some(mut unit) = self.store.get_unit(unit_id)? else {
                return Ok(false);
            };
            if unit.status() != UnitStatus::Available {
                return Ok(false);
            }
            unit.transition_to(UnitStatus::Reserved)?;
            self.store.update_unit(unit)?;
            Ok(true)
        })
    }

    /// `Reserved -> Available`.
    pub fn release(&self, unit_id: UnitId) -> DomainResult<Unit> {
        self.transition_from(unit_id, UnitStatus::Reserved, UnitStatus::Available)
    }

    /// `Reserved -> InTransit`: the unit leaves its slot.
    pub fn dispatch(&self, unit_id: UnitId) -> DomainResult<Unit> {
        self.locks.with_lock(unit_id, || -> DomainResult<Unit> {
            let original = self.load(unit_id)?;
            let mut unit = original.clone();
            unit.transition_to(UnitStatus::InTransit)?;
            unit.set_location(None);
            self.store.update_unit(unit.clone())?;

            if let Some(location_id) = original.location_id() {
                if let Err(e) = self.allocator.vacate(location_id) {
                    self.store.update_unit(original)?;
                    return Err(e);
                }
            }
            Ok(unit)
        })
    }

    /// `Delivered -> Available`: a returned unit, not yet placed.
    pub fn restock(&self, unit_id: UnitId) -> DomainResult<Unit> {
        self.transition_from(unit_id, UnitStatus::Delivered, UnitStatus::Available)
    }

    fn transition_from(
        &self,
        unit_id: UnitId,
        expected: UnitStatus,
        next: UnitStatus,
    ) -> DomainResult<Unit> {
        self.locks.with_lock(unit_id, || -> DomainResult<Unit> {
            let mut unit = self.load(unit_id)?;
            if unit.status() != expected {
                return Err(DomainError::invalid_transition(unit.status(), next));
            }
            unit.transition_to(next)?;
            self.store.update_unit(unit.clone())?;
            Ok(unit)
        })
    }

    fn load(&self, unit_id: UnitId) -> DomainResult<Unit> {
        self.store
            .get_unit(unit_id)?
            .ok_or_else(|| DomainError::not_found("unit", unit_id))
    }
}
