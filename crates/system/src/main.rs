use std::collections::BTreeMap;

use anyhow::{Context, bail};
use chrono::Utc;

use stockroom_core::{CustomerId, Dimensions, LocationId, OrderId, ProductId, UnitId};
use stockroom_infra::EngineConfig;
use stockroom_inventory::{Location, LocationCategory, Unit};
use stockroom_products::Product;
use stockroom_sales::Order;
use stockroom_system::InventorySystem;

fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env().context("loading engine configuration")?;
    stockroom_observability::init(&config.log_filter);

    let system = InventorySystem::in_memory(&config);
    tracing::info!(strategy = %system.location_strategy(), "demo starting");

    let location_id = LocationId::new();
    let shelf = Location::new(
        location_id,
        LocationCategory::Medium,
        Dimensions::new(100.0, 50.0, 50.0)?,
    );
    if !system.add_location(shelf) {
        bail!("could not add location {location_id}");
    }

    let product_id = ProductId::new();
    let product = Product::new(
        product_id,
        "Test Product",
        "A test product",
        1_999,
        1.5,
        Dimensions::new(20.0, 15.0, 10.0)?,
    )?;
    if !system.add_product(product) {
        bail!("could not add product {product_id}");
    }

    let unit_id = UnitId::new();
    if !system.add_unit(Unit::new(unit_id, product_id)) {
        bail!("could not place unit {unit_id}");
    }

    let order_id = OrderId::new();
    let order = Order::new(
        order_id,
        CustomerId::new(),
        BTreeMap::from([(product_id, 1)]),
        Utc::now(),
    )?;
    if !system.place_order(order) {
        bail!("could not place order {order_id}");
    }
    let shipped = system.process_order(order_id);
    tracing::info!(order_id = %order_id, shipped, "order processed");

    let report = system.generate_report()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
