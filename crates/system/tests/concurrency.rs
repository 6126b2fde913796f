use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use chrono::Utc;

use stockroom_core::{CustomerId, Dimensions, LocationId, OrderId, ProductId, UnitId};
use stockroom_infra::{EngineConfig, InMemoryStorage};
use stockroom_inventory::{Location, LocationCategory, PlacementStrategy, Unit, UnitStatus};
use stockroom_products::Product;
use stockroom_sales::{Order, OrderStatus};
use stockroom_system::InventorySystem;

type System = InventorySystem<Arc<InMemoryStorage>>;

fn system(strategy: PlacementStrategy) -> Arc<System> {
    let config = EngineConfig {
        placement_strategy: strategy,
        placement_attempts: 64,
        ..EngineConfig::default()
    };
    Arc::new(InventorySystem::in_memory(&config))
}

fn add_product(system: &System) -> ProductId {
    let id = ProductId::new();
    let dims = Dimensions::new(1.0, 1.0, 1.0).unwrap();
    assert!(system.add_product(Product::new(id, "Widget", "", 100, 1.0, dims).unwrap()));
    id
}

fn add_locations(system: &System, count: usize) -> Vec<LocationId> {
    (0..count)
        .map(|i| {
            let id = LocationId::new();
            let side = 2.0 + i as f64;
            let dims = Dimensions::new(side, side, side).unwrap();
            assert!(system.add_location(Location::new(id, LocationCategory::Small, dims)));
            id
        })
        .collect()
}

fn place_order(system: &System, lines: &[(ProductId, u32)]) -> OrderId {
    let order = Order::new(
        OrderId::new(),
        CustomerId::new(),
        lines.iter().copied().collect(),
        Utc::now(),
    )
    .unwrap();
    let id = order.id_typed();
    assert!(system.place_order(order));
    id
}

fn assert_occupancy_consistent(system: &System) {
    let units = system.list_units(None, None).unwrap();
    for location in system.list_locations().unwrap() {
        let holders = units
            .iter()
            .filter(|u| u.location_id() == Some(location.id_typed()))
            .count();
        assert_eq!(location.is_occupied(), holders == 1);
        assert!(holders <= 1);
    }
}

#[test]
fn competing_orders_for_the_same_units_never_oversell() {
    for _ in 0..20 {
        let system = system(PlacementStrategy::FirstFit);
        let p = add_product(&system);
        add_locations(&system, 2);
        for _ in 0..2 {
            assert!(system.add_unit(Unit::new(UnitId::new(), p)));
        }

        // Both orders are accepted: each sees two available units.
        let orders = [place_order(&system, &[(p, 2)]), place_order(&system, &[(p, 2)])];
        let barrier = Arc::new(Barrier::new(orders.len()));
        let handles: Vec<_> = orders
            .iter()
            .map(|order_id| {
                let system = Arc::clone(&system);
                let barrier = Arc::clone(&barrier);
                let order_id = *order_id;
                thread::spawn(move || {
                    barrier.wait();
                    system.process_order(order_id)
                })
            })
            .collect();
        let shipped = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(shipped, 1);
        let statuses: Vec<OrderStatus> = orders
            .iter()
            .map(|id| system.get_order(*id).unwrap().unwrap().status())
            .collect();
        assert!(statuses.contains(&OrderStatus::Shipped));
        assert!(statuses.contains(&OrderStatus::Cancelled));
        assert_eq!(
            system.list_units(Some(p), Some(UnitStatus::Reserved)).unwrap().len(),
            2
        );
    }
}

#[test]
fn overlapping_multi_product_orders_do_not_deadlock() {
    let system = system(PlacementStrategy::FirstFit);
    let a = add_product(&system);
    let b = add_product(&system);
    add_locations(&system, 40);
    for _ in 0..20 {
        assert!(system.add_unit(Unit::new(UnitId::new(), a)));
        assert!(system.add_unit(Unit::new(UnitId::new(), b)));
    }

    // Every order draws on both products.
    let orders: Vec<OrderId> = (0..20)
        .map(|_| place_order(&system, &[(a, 1), (b, 1)]))
        .collect();

    let barrier = Arc::new(Barrier::new(orders.len()));
    let handles: Vec<_> = orders
        .iter()
        .map(|order_id| {
            let system = Arc::clone(&system);
            let barrier = Arc::clone(&barrier);
            let order_id = *order_id;
            thread::spawn(move || {
                barrier.wait();
                system.process_order(order_id)
            })
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }

    let reserved: HashSet<UnitId> = orders
        .iter()
        .flat_map(|id| system.orders().reserved_units(*id).unwrap())
        .collect();
    assert_eq!(reserved.len(), 40);
    assert!(system.available_units(a).unwrap().is_empty());
    assert!(system.available_units(b).unwrap().is_empty());
}

#[test]
fn concurrent_placements_fill_each_location_once() {
    for strategy in [PlacementStrategy::FirstFit, PlacementStrategy::BestFit] {
        let system = system(strategy);
        let p = add_product(&system);
        add_locations(&system, 8);

        let threads = 12;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let system = Arc::clone(&system);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    system.add_unit(Unit::new(UnitId::new(), p))
                })
            })
            .collect();
        let placed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        // Twelve contenders, eight slots.
        assert_eq!(placed, 8);
        assert!(system.available_locations().unwrap().is_empty());
        assert_eq!(system.list_units(Some(p), None).unwrap().len(), 8);
        assert_occupancy_consistent(&system);
    }
}

#[test]
fn cancelling_while_other_orders_process_releases_only_its_units() {
    let system = system(PlacementStrategy::FirstFit);
    let p = add_product(&system);
    add_locations(&system, 10);
    for _ in 0..10 {
        assert!(system.add_unit(Unit::new(UnitId::new(), p)));
    }

    let shipped: Vec<OrderId> = (0..4).map(|_| place_order(&system, &[(p, 2)])).collect();
    let cancelled: Vec<OrderId> = (0..4).map(|_| place_order(&system, &[(p, 1)])).collect();

    let barrier = Arc::new(Barrier::new(shipped.len() + cancelled.len()));
    let mut handles = Vec::new();
    for id in &shipped {
        let (system, barrier, id) = (Arc::clone(&system), Arc::clone(&barrier), *id);
        handles.push(thread::spawn(move || {
            barrier.wait();
            system.process_order(id)
        }));
    }
    for id in &cancelled {
        let (system, barrier, id) = (Arc::clone(&system), Arc::clone(&barrier), *id);
        handles.push(thread::spawn(move || {
            barrier.wait();
            system.cancel_order(id)
        }));
    }
    for h in handles {
        assert!(h.join().unwrap());
    }

    assert_eq!(
        system.list_units(Some(p), Some(UnitStatus::Reserved)).unwrap().len(),
        8
    );
    for id in &shipped {
        assert_eq!(system.orders().reserved_units(*id).unwrap().len(), 2);
    }
    for id in &cancelled {
        assert_eq!(
            system.get_order(*id).unwrap().unwrap().status(),
            OrderStatus::Cancelled
        );
    }
}
