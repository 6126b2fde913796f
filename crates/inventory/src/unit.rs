use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, LocationId, ProductId, UnitId};

/// Unit status lifecycle.
///
/// ```text
/// Available  -> Reserved
/// Reserved   -> InTransit | Available
/// InTransit  -> Delivered
/// Delivered  -> Available
/// ```
///
/// There is no terminal state: delivered units can be restocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Available,
    Reserved,
    InTransit,
    Delivered,
}

impl UnitStatus {
    pub const ALL: [UnitStatus; 4] = [
        UnitStatus::Available,
        UnitStatus::Reserved,
        UnitStatus::InTransit,
        UnitStatus::Delivered,
    ];

    pub fn can_transition_to(self, next: UnitStatus) -> bool {
        use UnitStatus::*;
        matches!(
            (self, next),
            (Available, Reserved)
                | (Reserved, InTransit)
                | (Reserved, Available)
                | (InTransit, Delivered)
                | (Delivered, Available)
        )
    }

    /// Units in these states belong to an order and must not be removed.
    pub fn is_committed_to_order(self) -> bool {
        matches!(self, UnitStatus::Reserved | UnitStatus::InTransit)
    }
}

/// One physical unit of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    product_id: ProductId,
    location_id: Option<LocationId>,
    status: UnitStatus,
}

impl Unit {
    /// New unit: `Available`, not yet placed.
    pub fn new(id: UnitId, product_id: ProductId) -> Self {
        Self {
            id,
            product_id,
            location_id: None,
            status: UnitStatus::Available,
        }
    }

    pub fn id_typed(&self) -> UnitId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn location_id(&self) -> Option<LocationId> {
        self.location_id
    }

    pub fn status(&self) -> UnitStatus {
        self.status
    }

    /// Move to `next` if the lifecycle allows it; otherwise leave the unit
    /// untouched and return `InvalidTransition`.
    pub fn transition_to(&mut self, next: UnitStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(self.status, next));
        }
        self.status = next;
        Ok(())
    }

    pub(crate) fn set_location(&mut self, location_id: Option<LocationId>) {
        self.location_id = location_id;
    }
}

impl Entity for Unit {
    type Id = UnitId;
    const KIND: &'static str = "unit";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
