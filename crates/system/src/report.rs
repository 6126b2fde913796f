use serde::{Deserialize, Serialize};

use stockroom_core::DomainResult;
use stockroom_inventory::{LocationFilter, LocationStore, UnitFilter, UnitStore};
use stockroom_products::ProductCatalog;
use stockroom_sales::{OrderFilter, OrderStatus, OrderStore};

/// Point-in-time counts over the storage collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReport {
    pub total_products: usize,
    pub total_units: usize,
    pub available_locations: usize,
    pub pending_orders: usize,
}

impl InventoryReport {
    pub fn collect<S>(store: &S) -> DomainResult<Self>
    where
        S: ProductCatalog + UnitStore + LocationStore + OrderStore,
    {
        Ok(Self {
            total_products: store.list_products()?.len(),
            total_units: store.count_units(&UnitFilter::default())?,
            available_locations: store.list_locations(&LocationFilter::available())?.len(),
            pending_orders: store
                .list_orders(&OrderFilter::status(OrderStatus::Pending))?
                .len(),
        })
    }
}
