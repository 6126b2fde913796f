use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;

use stockroom_core::{CustomerId, Dimensions, LocationId, OrderId, ProductId, UnitId};
use stockroom_infra::{EngineConfig, InMemoryStorage};
use stockroom_inventory::{Location, LocationCategory, PlacementStrategy, Unit, UnitStatus};
use stockroom_products::Product;
use stockroom_sales::{Order, OrderStatus};
use stockroom_system::{InventoryReport, InventorySystem};

type System = InventorySystem<Arc<InMemoryStorage>>;

fn system() -> System {
    InventorySystem::in_memory(&EngineConfig::default())
}

fn add_product(system: &System, price: u64, side: f64) -> ProductId {
    let id = ProductId::new();
    let dims = Dimensions::new(side, side, side).unwrap();
    assert!(system.add_product(Product::new(id, "Widget", "", price, 1.0, dims).unwrap()));
    id
}

fn add_location(system: &System, l: f64, w: f64, h: f64) -> LocationId {
    let id = LocationId::new();
    let dims = Dimensions::new(l, w, h).unwrap();
    assert!(system.add_location(Location::new(id, LocationCategory::Medium, dims)));
    id
}

/// `count` units of `product_id`, each in a fresh location.
fn stock(system: &System, product_id: ProductId, count: usize) -> Vec<UnitId> {
    (0..count)
        .map(|_| {
            add_location(system, 50.0, 50.0, 50.0);
            let id = UnitId::new();
            assert!(system.add_unit(Unit::new(id, product_id)));
            id
        })
        .collect()
}

fn order(customer_id: CustomerId, lines: &[(ProductId, u32)]) -> Order {
    Order::new(
        OrderId::new(),
        customer_id,
        lines.iter().copied().collect::<BTreeMap<_, _>>(),
        Utc::now(),
    )
    .unwrap()
}

fn unit_statuses(system: &System, product_id: ProductId) -> HashMap<UnitStatus, usize> {
    let mut counts = HashMap::new();
    for unit in system.list_units(Some(product_id), None).unwrap() {
        *counts.entry(unit.status()).or_insert(0) += 1;
    }
    counts
}

/// Each location's flag is set iff exactly one unit references it.
fn assert_occupancy_consistent(system: &System) {
    let units = system.list_units(None, None).unwrap();
    for location in system.list_locations().unwrap() {
        let holders = units
            .iter()
            .filter(|u| u.location_id() == Some(location.id_typed()))
            .count();
        assert!(holders <= 1, "location {} held by {holders} units", location.id_typed());
        assert_eq!(
            location.is_occupied(),
            holders == 1,
            "location {} flag disagrees with unit references",
            location.id_typed()
        );
    }
}

#[test]
fn placement_follows_first_fit_then_best_fit() {
    let system = system();
    let p = add_product(&system, 100, 10.0);
    let _a = add_location(&system, 5.0, 5.0, 5.0);
    let b = add_location(&system, 20.0, 20.0, 20.0);
    let c = add_location(&system, 12.0, 12.0, 12.0);

    assert_eq!(system.find_suitable_location(p).unwrap().unwrap().id_typed(), b);
    system.set_location_strategy(PlacementStrategy::BestFit);
    assert_eq!(system.find_suitable_location(p).unwrap().unwrap().id_typed(), c);
    assert_occupancy_consistent(&system);
}

#[test]
fn order_rejected_when_stock_is_short() {
    let system = system();
    let p = add_product(&system, 100, 1.0);
    stock(&system, p, 2);

    let short = order(CustomerId::new(), &[(p, 3)]);
    let id = short.id_typed();
    assert!(!system.place_order(short));
    assert!(system.get_order(id).unwrap().is_none());
    assert_eq!(system.generate_report().unwrap().pending_orders, 0);
}

#[test]
fn processed_order_reserves_exactly_the_requested_units() {
    let system = system();
    let a = add_product(&system, 1_000, 1.0);
    let b = add_product(&system, 250, 1.0);
    stock(&system, a, 3);
    stock(&system, b, 4);

    let placed = order(CustomerId::new(), &[(a, 2), (b, 3)]);
    let id = placed.id_typed();
    assert!(system.place_order(placed));
    assert_eq!(system.get_order(id).unwrap().unwrap().total_amount(), 2 * 1_000 + 3 * 250);

    assert!(system.process_order(id));
    assert_eq!(system.get_order(id).unwrap().unwrap().status(), OrderStatus::Shipped);
    assert_eq!(unit_statuses(&system, a).get(&UnitStatus::Reserved), Some(&2));
    assert_eq!(unit_statuses(&system, b).get(&UnitStatus::Reserved), Some(&3));
    assert_eq!(system.orders().reserved_units(id).unwrap().len(), 5);

    // Not pending any more.
    assert!(!system.process_order(id));
    assert!(!system.process_order(OrderId::new()));
}

#[test]
fn processing_short_order_cancels_and_rolls_back() {
    let system = system();
    let a = add_product(&system, 100, 1.0);
    let b = add_product(&system, 100, 1.0);
    stock(&system, a, 2);
    let b_units = stock(&system, b, 1);

    let placed = order(CustomerId::new(), &[(a, 2), (b, 1)]);
    let id = placed.id_typed();
    assert!(system.place_order(placed));

    // The only unit of b is taken after the order was accepted.
    assert!(system.remove_unit(b_units[0]));

    assert!(!system.process_order(id));
    assert_eq!(system.get_order(id).unwrap().unwrap().status(), OrderStatus::Cancelled);
    assert_eq!(unit_statuses(&system, a).get(&UnitStatus::Available), Some(&2));
    assert!(system.orders().reserved_units(id).unwrap().is_empty());
    assert_occupancy_consistent(&system);
}

#[test]
fn cancelling_is_scoped_to_the_order() {
    let system = system();
    let p = add_product(&system, 100, 1.0);
    stock(&system, p, 3);

    let shipped = order(CustomerId::new(), &[(p, 2)]);
    let pending = order(CustomerId::new(), &[(p, 1)]);
    let (shipped_id, pending_id) = (shipped.id_typed(), pending.id_typed());
    assert!(system.place_order(shipped));
    assert!(system.place_order(pending));
    assert!(system.process_order(shipped_id));

    assert!(system.cancel_order(pending_id));
    assert_eq!(system.get_order(pending_id).unwrap().unwrap().status(), OrderStatus::Cancelled);
    // The shipped order keeps its reservations.
    assert_eq!(unit_statuses(&system, p).get(&UnitStatus::Reserved), Some(&2));
    assert_eq!(system.orders().reserved_units(shipped_id).unwrap().len(), 2);

    // Terminal and shipped orders cannot be cancelled.
    assert!(!system.cancel_order(pending_id));
    assert!(!system.cancel_order(shipped_id));
}

#[test]
fn delivery_empties_slots_and_restock_refills_them() {
    let system = system();
    let p = add_product(&system, 100, 1.0);
    let units = stock(&system, p, 2);

    let placed = order(CustomerId::new(), &[(p, 2)]);
    let id = placed.id_typed();
    assert!(system.place_order(placed));
    assert!(!system.deliver_order(id));
    assert!(system.process_order(id));
    assert!(system.deliver_order(id));

    assert_eq!(system.get_order(id).unwrap().unwrap().status(), OrderStatus::Delivered);
    assert_eq!(unit_statuses(&system, p).get(&UnitStatus::Delivered), Some(&2));
    assert_eq!(system.available_locations().unwrap().len(), 2);
    assert_occupancy_consistent(&system);

    for unit_id in &units {
        assert!(system.restock_unit(*unit_id));
    }
    assert_eq!(unit_statuses(&system, p).get(&UnitStatus::Available), Some(&2));
    assert!(system.available_locations().unwrap().is_empty());
    assert_occupancy_consistent(&system);
}

#[test]
fn reserved_units_cannot_be_removed() {
    let system = system();
    let p = add_product(&system, 100, 1.0);
    let units = stock(&system, p, 1);
    let placed = order(CustomerId::new(), &[(p, 1)]);
    let id = placed.id_typed();
    assert!(system.place_order(placed));
    assert!(system.process_order(id));

    assert!(!system.remove_unit(units[0]));
    assert!(system.get_unit(units[0]).unwrap().is_some());
    assert!(!system.remove_unit(UnitId::new()));
}

#[test]
fn relocation_moves_units_and_frees_the_old_slot() {
    let system = system();
    let p = add_product(&system, 100, 1.0);
    let units = stock(&system, p, 2);
    let unit = system.get_unit(units[0]).unwrap().unwrap();
    let old = unit.location_id().unwrap();
    let taken = system.get_unit(units[1]).unwrap().unwrap().location_id().unwrap();
    let free = add_location(&system, 5.0, 5.0, 5.0);

    assert!(system.relocate_unit(units[0], free));
    assert_eq!(system.get_unit(units[0]).unwrap().unwrap().location_id(), Some(free));
    assert!(!system.get_location(old).unwrap().unwrap().is_occupied());

    // Moving onto an occupied slot fails and leaves the unit unplaced.
    assert!(!system.relocate_unit(units[0], taken));
    assert_eq!(system.get_unit(units[0]).unwrap().unwrap().location_id(), None);
    assert!(!system.get_location(free).unwrap().unwrap().is_occupied());
    assert_occupancy_consistent(&system);
}

#[test]
fn history_lists_a_customers_orders_newest_first() {
    let system = system();
    let p = add_product(&system, 100, 1.0);
    stock(&system, p, 1);
    let customer = CustomerId::new();

    let older = Order::new(
        OrderId::new(),
        customer,
        BTreeMap::from([(p, 1)]),
        Utc::now() - chrono::Duration::hours(1),
    )
    .unwrap();
    let newer = order(customer, &[(p, 1)]);
    let (older_id, newer_id) = (older.id_typed(), newer.id_typed());
    assert!(system.place_order(older));
    assert!(system.place_order(newer));
    assert!(system.place_order(order(CustomerId::new(), &[(p, 1)])));

    let history: Vec<OrderId> = system
        .order_history(customer)
        .unwrap()
        .iter()
        .map(Order::id_typed)
        .collect();
    assert_eq!(history, vec![newer_id, older_id]);
    assert_eq!(system.list_orders(Some(OrderStatus::Pending)).unwrap().len(), 3);
}

#[test]
fn report_counts_products_units_locations_and_pending_orders() {
    let system = system();
    let p = add_product(&system, 100, 1.0);
    add_product(&system, 100, 1.0);
    stock(&system, p, 2);
    add_location(&system, 5.0, 5.0, 5.0);
    assert!(system.place_order(order(CustomerId::new(), &[(p, 1)])));

    let report = system.generate_report().unwrap();
    assert_eq!(
        report,
        InventoryReport {
            total_products: 2,
            total_units: 2,
            available_locations: 1,
            pending_orders: 1,
        }
    );
}

#[test]
fn a_shipped_unit_cannot_be_handed_to_a_second_order() {
    let system = system();
    let p = add_product(&system, 100, 1.0);
    let units = stock(&system, p, 1);

    let first = order(CustomerId::new(), &[(p, 1)]);
    let first_id = first.id_typed();
    assert!(system.place_order(first));
    assert!(system.process_order(first_id));

    // Putting the unit back on the shelf by hand is refused.
    assert!(!system.transition_unit(units[0], UnitStatus::Available));
    assert_eq!(system.available_units(p).unwrap().len(), 0);

    let second = order(CustomerId::new(), &[(p, 1)]);
    let second_id = second.id_typed();
    assert!(!system.place_order(second));
    assert!(!system.process_order(second_id));

    assert!(system.deliver_order(first_id));
    assert_eq!(unit_statuses(&system, p).get(&UnitStatus::Delivered), Some(&1));
    assert!(system.get_order(second_id).unwrap().is_none());
    assert_occupancy_consistent(&system);
}
