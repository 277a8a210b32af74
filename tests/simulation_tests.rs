//! Whole-simulation and vehicle behavior tests
//!
//! Drives the seeded simulation loop and individual vehicles against a
//! live signal controller: lane assignment, signal gating, lane changes,
//! spawn ordering, metrics accrual, and level-of-service grading.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::SeedableRng;

use intersection_sim::simulation::{
    initial_lane, level_of_service, Approach, ControlMode, EnvironmentState, LaneNeighbor,
    MetricsCollector, Movement, PhaseTopology, SignalController, SignalTiming, SimConfig,
    Simulation, Vehicle, VehicleClass, VehicleId, VehicleTypeRegistry, Weather,
};

fn ns_green_controller() -> SignalController {
    // Fresh controllers start in phase 0; Simple phase 0 serves N/S
    SignalController::new(
        PhaseTopology::Simple,
        ControlMode::Pretimed,
        SignalTiming::default(),
    )
}

fn car_type(registry: &VehicleTypeRegistry) -> &intersection_sim::simulation::VehicleType {
    registry
        .types()
        .iter()
        .find(|vtype| vtype.class == VehicleClass::Car)
        .unwrap()
}

#[test]
fn test_initial_lane_by_movement() {
    let mut rng = StdRng::seed_from_u64(1);
    for num_lanes in 1..=4 {
        assert_eq!(initial_lane(Movement::Left, num_lanes, &mut rng), 0);
        assert_eq!(
            initial_lane(Movement::Right, num_lanes, &mut rng),
            num_lanes - 1
        );
        for _ in 0..20 {
            assert!(initial_lane(Movement::Thru, num_lanes, &mut rng) < num_lanes);
        }
    }
}

#[test]
fn test_level_of_service_thresholds() {
    assert_eq!(level_of_service(0.0), 'A');
    assert_eq!(level_of_service(10.0), 'A');
    assert_eq!(level_of_service(10.5), 'B');
    assert_eq!(level_of_service(20.0), 'B');
    assert_eq!(level_of_service(35.0), 'C');
    assert_eq!(level_of_service(55.0), 'D');
    assert_eq!(level_of_service(80.0), 'E');
    assert_eq!(level_of_service(80.5), 'F');
}

#[test]
fn test_zero_volume_reports_zero_delay() {
    let mut metrics = MetricsCollector::new();
    metrics.finalize();

    for approach in Approach::ALL {
        assert_eq!(metrics.approach(approach).avg_delay, 0.0);
        assert_eq!(metrics.approach(approach).los, 'A');
    }
    assert_eq!(metrics.overall_avg_delay, 0.0);
    assert_eq!(metrics.overall_los, 'A');
}

#[test]
fn test_delay_accrual_and_average() {
    let config = SimConfig::default();
    let registry = VehicleTypeRegistry::new();
    let mut rng = StdRng::seed_from_u64(2);

    let mut vehicle = Vehicle::new(
        VehicleId(0),
        Approach::North,
        Movement::Thru,
        car_type(&registry),
        &config,
        &mut rng,
    );
    vehicle.stopped = true;

    let mut metrics = MetricsCollector::new();
    metrics.record_arrival(Approach::North);
    metrics.record_arrival(Approach::North);
    let vehicles = vec![vehicle];
    metrics.sample(30.0, &vehicles);
    metrics.finalize();

    // 30s of delay over 2 counted vehicles -> 15s average -> LOS B
    let north = metrics.approach(Approach::North);
    assert_eq!(north.total_delay, 30.0);
    assert_eq!(north.max_queue, 1);
    assert_eq!(north.avg_delay, 15.0);
    assert_eq!(north.los, 'B');
    assert_eq!(metrics.overall_avg_delay, 15.0);
}

#[test]
fn test_queue_counts_skip_cleared_vehicles() {
    let config = SimConfig::default();
    let registry = VehicleTypeRegistry::new();
    let mut rng = StdRng::seed_from_u64(3);

    let mut queued = Vehicle::new(
        VehicleId(0),
        Approach::East,
        Movement::Thru,
        car_type(&registry),
        &config,
        &mut rng,
    );
    queued.stopped = true;

    let mut cleared = Vehicle::new(
        VehicleId(1),
        Approach::East,
        Movement::Thru,
        car_type(&registry),
        &config,
        &mut rng,
    );
    cleared.stopped = true;
    cleared.passed_intersection = true;

    let counts = MetricsCollector::queue_counts(&[queued, cleared]);
    assert_eq!(counts[Approach::East.index()], 1);
    assert_eq!(counts[Approach::North.index()], 0);
}

#[test]
fn test_red_signal_stops_vehicle_at_stop_line() {
    let config = SimConfig::default();
    let registry = VehicleTypeRegistry::new();
    let mut rng = StdRng::seed_from_u64(4);
    let controller = ns_green_controller();
    let environment = EnvironmentState::new();

    // Eastbound faces red while N/S holds the green
    let mut vehicle = Vehicle::new(
        VehicleId(0),
        Approach::East,
        Movement::Thru,
        car_type(&registry),
        &config,
        &mut rng,
    );
    vehicle.x = 450.0;

    for _ in 0..60 {
        vehicle.update(0.1, &[], &controller, &environment, &config, &mut rng);
    }

    // Stop line at x=365; a 30-long car rests with its center at 380
    assert!(vehicle.stopped);
    assert!(vehicle.wait_time > 0.0);
    assert!((vehicle.x - 380.0).abs() < 1e-3, "rested at x={}", vehicle.x);
    assert!(!vehicle.has_passed_stop_line(&config));
}

#[test]
fn test_green_signal_lets_vehicle_through() {
    let config = SimConfig::default();
    let registry = VehicleTypeRegistry::new();
    let mut rng = StdRng::seed_from_u64(5);
    let controller = ns_green_controller();
    let environment = EnvironmentState::new();

    let mut vehicle = Vehicle::new(
        VehicleId(0),
        Approach::North,
        Movement::Thru,
        car_type(&registry),
        &config,
        &mut rng,
    );

    for _ in 0..50 {
        vehicle.update(0.1, &[], &controller, &environment, &config, &mut rng);
    }

    assert!(!vehicle.stopped);
    assert_eq!(vehicle.wait_time, 0.0);
    assert!(vehicle.passed_intersection);
}

#[test]
fn test_emergency_vehicle_runs_the_red() {
    let config = SimConfig::default();
    let registry = VehicleTypeRegistry::new();
    let mut rng = StdRng::seed_from_u64(6);
    let controller = ns_green_controller();
    let environment = EnvironmentState::new();

    let emergency = registry
        .types()
        .iter()
        .find(|vtype| vtype.class == VehicleClass::Emergency)
        .unwrap();
    let mut vehicle = Vehicle::new(
        VehicleId(0),
        Approach::East,
        Movement::Thru,
        emergency,
        &config,
        &mut rng,
    );
    vehicle.x = 450.0;

    for _ in 0..30 {
        vehicle.update(0.1, &[], &controller, &environment, &config, &mut rng);
    }

    assert!(!vehicle.stopped);
    assert!(vehicle.passed_intersection);
    assert!(vehicle.x < 300.0, "still at x={}", vehicle.x);
}

#[test]
fn test_lane_change_after_cooldown() {
    let config = SimConfig::default();
    let registry = VehicleTypeRegistry::new();
    let mut rng = StdRng::seed_from_u64(7);
    let controller = ns_green_controller();
    let environment = EnvironmentState::new();

    // A left-turner displaced from its required lane pulls back to lane 0
    // once the cooldown elapses
    let mut vehicle = Vehicle::new(
        VehicleId(0),
        Approach::North,
        Movement::Left,
        car_type(&registry),
        &config,
        &mut rng,
    );
    vehicle.lane = 1;

    for _ in 0..25 {
        vehicle.update(0.1, &[], &controller, &environment, &config, &mut rng);
    }

    assert_eq!(vehicle.lane, 0);
    // Northbound lane 0 center: 300 - 60 + 15
    assert_eq!(vehicle.x, 255.0);
}

#[test]
fn test_lane_change_blocked_by_occupant() {
    let config = SimConfig::default();
    let registry = VehicleTypeRegistry::new();
    let mut rng = StdRng::seed_from_u64(8);
    let controller = ns_green_controller();
    let environment = EnvironmentState::new();

    // Eastbound left-turner held at the red, needing lane 0
    let mut vehicle = Vehicle::new(
        VehicleId(0),
        Approach::East,
        Movement::Left,
        car_type(&registry),
        &config,
        &mut rng,
    );
    vehicle.x = 450.0;
    vehicle.lane = 1;

    for _ in 0..60 {
        // A neighbor parked alongside in the target lane blocks the change
        let blocker = LaneNeighbor {
            id: VehicleId(99),
            approach: Approach::East,
            lane: 0,
            progress: -vehicle.x,
            length: 30.0,
            stopped: true,
        };
        vehicle.update(
            0.1,
            &[blocker],
            &controller,
            &environment,
            &config,
            &mut rng,
        );
    }

    assert_eq!(vehicle.lane, 1);
}

#[test]
fn test_lane_changes_occur_in_running_traffic() {
    // Through traffic redraws its lane preference once the cooldown
    // elapses, so an ordinary run must show actual lane changes
    let mut sim = Simulation::new_with_seed(SimConfig::default(), 31);

    let mut lanes: HashMap<usize, usize> = HashMap::new();
    let mut changes = 0u32;
    for _ in 0..1_200 {
        sim.tick(0.1);
        for vehicle in &sim.vehicles {
            if let Some(previous) = lanes.insert(vehicle.id.0, vehicle.lane) {
                if previous != vehicle.lane {
                    changes += 1;
                }
            }
        }
    }

    assert!(changes > 0, "no vehicle ever changed lanes");
}

#[test]
fn test_spawned_vehicles_hold_position_on_spawn_tick() {
    let mut config = SimConfig::default();
    config.volumes = [1_000_000.0, 0.0, 0.0, 0.0];
    let mut sim = Simulation::new_with_seed(config, 11);

    let mut seen: HashSet<usize> = HashSet::new();
    for _ in 0..50 {
        sim.tick(0.1);
        for vehicle in &sim.vehicles {
            if seen.insert(vehicle.id.0) {
                // First sighting: still exactly at its entry position
                assert_eq!(vehicle.approach, Approach::North);
                assert_eq!(vehicle.y, -vehicle.length);
            }
        }
    }
    assert!(!seen.is_empty(), "no vehicles spawned");
}

#[test]
fn test_vehicle_cap_is_respected() {
    let mut config = SimConfig::default();
    config.volumes = [1_000_000.0; 4];
    let mut sim = Simulation::new_with_seed(config, 12);

    for _ in 0..300 {
        sim.tick(0.1);
        assert!(sim.vehicles.len() <= sim.config.max_vehicles);
    }
    // Saturated demand keeps the population pinned near the cap; exits
    // happen after arrivals within a tick, so allow a little slack
    assert!(sim.vehicles.len() >= sim.config.max_vehicles - 8);
}

#[test]
fn test_red_approach_accrues_delay_and_queues() {
    // Only eastbound demand; Simple topology keeps E/W red for the first
    // 35 seconds (30 green + 3 yellow + 2 all-red on N/S)
    let mut config = SimConfig::default();
    config.volumes = [0.0, 0.0, 2000.0, 0.0];
    let mut sim = Simulation::new_with_seed(config, 13);
    sim.start_measurement(300.0);

    for _ in 0..350 {
        sim.tick(0.1);
    }

    let east = sim.metrics.approach(Approach::East);
    assert!(east.volume >= 1);
    assert!(east.total_delay > 0.0);
    assert!(east.max_queue >= 1);
    for approach in [Approach::North, Approach::South, Approach::West] {
        assert_eq!(sim.metrics.approach(approach).volume, 0);
    }
}

#[test]
fn test_environment_factors_combine() {
    let mut environment = EnvironmentState::new();
    assert!(environment.is_daytime());
    assert_eq!(environment.speed_factor(), 1.0);
    assert_eq!(environment.safety_factor(), 1.0);

    environment.weather = Weather::Snow;
    environment.time_of_day = 700.0;
    assert!(!environment.is_daytime());
    assert!((environment.speed_factor() - 0.7 * 0.9).abs() < 1e-6);
    assert_eq!(environment.safety_factor(), 1.5);
}

#[test]
fn test_day_night_cycle_wraps() {
    let mut environment = EnvironmentState::new();
    environment.time_of_day = 995.0;

    // Cycle disabled: clock stands still
    environment.update(1.0);
    assert_eq!(environment.time_of_day, 995.0);

    environment.cycle_enabled = true;
    environment.update(1.0);
    assert!((environment.time_of_day - 7.0).abs() < 1e-3);
}

#[test]
fn test_reset_clears_state() {
    let mut sim = Simulation::new_with_seed(SimConfig::default(), 14);
    sim.start_measurement(300.0);
    for _ in 0..200 {
        sim.tick(0.1);
    }

    sim.reset();
    assert!(sim.vehicles.is_empty());
    assert_eq!(sim.time, 0.0);
    assert_eq!(sim.metrics.total_vehicles, 0);
    for approach in Approach::ALL {
        assert_eq!(sim.metrics.approach(approach).volume, 0);
    }
}

#[test]
fn test_seeded_run_is_deterministic() {
    let run = |seed| {
        let mut sim = Simulation::new_with_seed(SimConfig::default(), seed);
        for _ in 0..600 {
            sim.tick(0.1);
        }
        let positions: Vec<(usize, u32, u32)> = sim
            .vehicles
            .iter()
            .map(|v| (v.id.0, v.x.to_bits(), v.y.to_bits()))
            .collect();
        (positions, sim.metrics.total_vehicles)
    };

    assert_eq!(run(21), run(21));
}

#[test]
fn test_default_run_spawns_and_grades() {
    let mut sim = Simulation::new_with_seed(SimConfig::default(), 42);
    sim.start_measurement(60.0);

    for _ in 0..600 {
        sim.tick(0.1);
    }

    let total: u32 = Approach::ALL
        .iter()
        .map(|approach| sim.metrics.approach(*approach).volume)
        .sum();
    assert!(total > 0, "no arrivals in 60 simulated seconds");
    assert!(sim.vehicles.len() <= sim.config.max_vehicles);
    assert!(sim.metrics.window_complete());

    sim.metrics.finalize();
    let grade = sim.metrics.overall_los;
    assert!(('A'..='F').contains(&grade));
}
