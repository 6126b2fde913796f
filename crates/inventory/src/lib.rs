//! Inventory domain: storage locations, physical units, and the machinery that
//! places units into locations.
//!
//! - [`PlacementStrategy`] picks a candidate location (pure).
//! - [`LocationAllocator`] owns occupancy mutation, serialized per location.
//! - [`UnitLifecycleManager`] creates, moves, transitions and removes units.

pub mod allocator;
pub mod lifecycle;
pub mod location;
pub mod store;
pub mod strategy;
pub mod unit;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use allocator::LocationAllocator;
pub use lifecycle::UnitLifecycleManager;
pub use location::{Location, LocationCategory};
pub use store::{LocationFilter, LocationStore, UnitFilter, UnitStore};
pub use strategy::PlacementStrategy;
pub use unit::{Unit, UnitStatus};
