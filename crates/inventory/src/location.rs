use serde::{Deserialize, Serialize};

use stockroom_core::{Dimensions, Entity, LocationId};

/// Size class of a location. Informational; fit is decided by dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationCategory {
    Small,
    Medium,
    Large,
}

/// Storage slot holding at most one unit.
///
/// `occupied` is true iff exactly one unit references this location. Only the
/// [`LocationAllocator`](crate::LocationAllocator) flips it. Deserialization
/// keeps a stored flag as-is, so new locations are admitted only when vacant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    id: LocationId,
    category: LocationCategory,
    dimensions: Dimensions,
    #[serde(default)]
    occupied: bool,
}

impl Location {
    /// New, unoccupied location.
    pub fn new(id: LocationId, category: LocationCategory, dimensions: Dimensions) -> Self {
        Self {
            id,
            category,
            dimensions,
            occupied: false,
        }
    }

    pub fn id_typed(&self) -> LocationId {
        self.id
    }

    pub fn category(&self) -> LocationCategory {
        self.category
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    pub fn is_available(&self) -> bool {
        !self.occupied
    }

    /// Mark occupied. Returns `false` (no change) if already occupied.
    pub(crate) fn occupy(&mut self) -> bool {
        if self.occupied {
            return false;
        }
        self.occupied = true;
        true
    }

    /// Mark vacant. Returns `false` (no change) if already vacant.
    pub(crate) fn vacate(&mut self) -> bool {
        if !self.occupied {
            return false;
        }
        self.occupied = false;
        true
    }
}

impl Entity for Location {
    type Id = LocationId;
    const KIND: &'static str = "location";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
