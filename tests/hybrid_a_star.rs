use std::f64::consts::FRAC_PI_4;

use hybrid_a_star::common::{PlanningError, Point2D, Pose2D};
use hybrid_a_star::path_planning::hybrid_a_star::{
    Car, HybridAStarPlanner, Limits, ParkingLot, PlannedPath, PlannerConfig, PlannerState,
    Rectangle, SearchOutcome, Vehicle, VehicleConfig, World, WorldConfig,
};
use hybrid_a_star::utils::RecordingObserver;

fn small_car() -> Car {
    Car::new(VehicleConfig {
        length: 0.8,
        width: 0.4,
        wheelbase: 1.0,
        steering_resolution: 0.2,
        steering_limit: 0.6,
        primitive_length: 1.0,
        ..Default::default()
    })
    .unwrap()
}

fn open_lot(parallel_expansion: bool) -> ParkingLot {
    let config = WorldConfig {
        limits: Limits::new(0.0, 10.0, 0.0, 10.0),
        yaw_resolution: FRAC_PI_4,
        start: Pose2D::new(0.0, 0.0, 0.0),
        goal: Pose2D::new(8.0, 8.0, 0.0),
        parallel_expansion,
        ..Default::default()
    };
    ParkingLot::new(config, small_car()).unwrap()
}

fn corridor() -> ParkingLot {
    let config = WorldConfig {
        limits: Limits::new(0.0, 10.0, 0.0, 10.0),
        yaw_resolution: FRAC_PI_4,
        start: Pose2D::new(0.5, 5.5, 0.0),
        goal: Pose2D::new(8.5, 5.5, 0.0),
        ..Default::default()
    };
    ParkingLot::new(config, small_car()).unwrap()
}

fn plan(world: &ParkingLot) -> SearchOutcome {
    let mut planner = HybridAStarPlanner::with_defaults(world).unwrap();
    planner.plan().unwrap()
}

fn assert_path_valid(world: &ParkingLot, planned: &PlannedPath) {
    for pose in &planned.path.poses {
        assert!(world.limits().contains(&pose.position()));
        let footprint = world.vehicle().footprint(pose);
        for obstacle in world.obstacles() {
            assert!(!obstacle.intersects(&footprint), "path collides at {:?}", pose);
        }
    }
}

#[test]
fn test_open_lot_reaches_goal_cell() {
    let world = open_lot(false);
    let outcome = plan(&world);
    let planned = outcome.path().expect("open lot should be solvable");

    let first = planned.path.first().unwrap();
    let last = planned.path.last().unwrap();
    assert_eq!(world.discretize(first), world.discretize(&world.start_pose()));
    assert_eq!(world.discretize(last), world.discretize(&world.goal_pose()));
    assert!(planned.cost >= planned.path.total_length() - 1e-6);
    assert_path_valid(&world, planned);
}

#[test]
fn test_repeated_runs_are_identical() {
    let world = open_lot(false);
    let first = plan(&world);
    let second = plan(&world);
    assert!(first.is_success());
    assert_eq!(first, second);
}

#[test]
fn test_parallel_expansion_matches_serial() {
    let serial_world = open_lot(false);
    let parallel_world = open_lot(true);

    let mut serial = HybridAStarPlanner::with_defaults(&serial_world).unwrap();
    let mut parallel = HybridAStarPlanner::with_defaults(&parallel_world).unwrap();
    let serial_outcome = serial.plan().unwrap();
    let parallel_outcome = parallel.plan().unwrap();

    assert_eq!(serial_outcome, parallel_outcome);
    assert_eq!(serial.stats(), parallel.stats());
}

#[test]
fn test_obstacle_forces_detour() {
    let free = corridor();
    let free_cost = plan(&free).path().unwrap().cost;

    let blocked = corridor()
        .with_obstacles(vec![Rectangle::new(Point2D::new(4.5, 5.5), 1.0, 3.0, 0.0).unwrap()]);
    match plan(&blocked) {
        SearchOutcome::Succeeded(planned) => {
            assert!(planned.cost > free_cost + 1e-6);
            assert_path_valid(&blocked, &planned);
        }
        SearchOutcome::Exhausted => {}
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_goal_outside_limits_exhausts() {
    let config = WorldConfig {
        limits: Limits::new(0.0, 4.0, 0.0, 4.0),
        yaw_resolution: FRAC_PI_4,
        start: Pose2D::new(1.5, 1.5, 0.0),
        goal: Pose2D::new(8.5, 1.5, 0.0),
        ..Default::default()
    };
    let world = ParkingLot::new(config, small_car()).unwrap();
    let mut planner = HybridAStarPlanner::with_defaults(&world).unwrap();
    assert_eq!(planner.plan().unwrap(), SearchOutcome::Exhausted);
    assert_eq!(planner.state(), PlannerState::Exhausted);
    assert!(planner.stats().expanded > 0);
}

#[test]
fn test_closed_capacity_exceeded() {
    let world = corridor();
    let config = PlannerConfig {
        closed_capacity: 3,
        ..Default::default()
    };
    let mut planner = HybridAStarPlanner::new(&world, config).unwrap();
    assert_eq!(
        planner.plan(),
        Err(PlanningError::CapacityExceeded { capacity: 3 })
    );
    assert_eq!(planner.state(), PlannerState::Aborted);
    assert_eq!(planner.closed().len(), 3);
}

#[test]
fn test_observer_records_search() {
    let world = corridor();
    let mut planner = HybridAStarPlanner::with_defaults(&world).unwrap();
    let mut observer = RecordingObserver::new();
    let outcome = planner
        .run_with_observer(world.start_pose(), world.goal_pose(), &mut observer)
        .unwrap();

    let recorded = observer.world().unwrap();
    assert_eq!(recorded.start, world.start_pose());
    assert_eq!(recorded.vehicle_dimensions, (0.8, 0.4));
    assert!(!observer.candidates().is_empty());
    assert_eq!(observer.path(), outcome.path().map(|p| &p.path));
}
