//! Occupancy mutation for storage locations.

use stockroom_core::{DomainError, DomainResult, LocationId, LockTable};

use crate::location::Location;
use crate::store::LocationStore;

/// Owns occupancy changes for locations.
///
/// Every `occupy`/`vacate` for a location id runs its read-check-write
/// against the store under that id's lock, so two concurrent `occupy` calls on
/// one location cannot both succeed. Distinct ids never contend. No other
/// lock is taken and no other I/O happens while a location lock is held.
#[derive(Debug)]
pub struct LocationAllocator<S> {
    store: S,
    locks: LockTable<LocationId>,
}

impl<S> LocationAllocator<S>
where
    S: LocationStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: LockTable::new(),
        }
    }

    /// Mark `id` occupied. `Ok(false)` means it already was (no change).
    pub fn occupy(&self, id: LocationId) -> DomainResult<bool> {
        self.mutate(id, Location::occupy)
    }

    /// Mark `id` vacant. `Ok(false)` means it already was (no change).
    pub fn vacate(&self, id: LocationId) -> DomainResult<bool> {
        self.mutate(id, Location::vacate)
    }

    pub fn is_available(&self, id: LocationId) -> DomainResult<bool> {
        Ok(self.load(id)?.is_available())
    }

    /// Number of location ids that have been locked at least once.
    pub fn tracked_locations(&self) -> usize {
        self.locks.len()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load(&self, id: LocationId) -> DomainResult<Location> {
        self.store
            .get_location(id)?
            .ok_or_else(|| DomainError::not_found("location", id))
    }

    fn mutate(&self, id: LocationId, change: fn(&mut Location) -> bool) -> DomainResult<bool> {
        self.locks.with_lock(id, || -> DomainResult<bool> {
            let mut location = self.load(id)?;
            if !change(&mut location) {
                return Ok(false);
            }
            self.store.update_location(location)?;
            Ok(true)
        })
    }
}
