//! Hybrid A* Path Planning Example
//!
//! Plans a car-like vehicle from the entrance of a small parking lot into a
//! free slot between parked cars, then renders the explored motion
//! primitives and the resulting path.

use std::f64::consts::FRAC_PI_2;

use hybrid_a_star::common::{Point2D, Pose2D};
use hybrid_a_star::path_planning::hybrid_a_star::{
    Car, GoalTolerance, HeuristicKind, HybridAStarPlanner, Limits, ParkingLot, PlannerConfig,
    Rectangle, SearchOutcome, VehicleConfig, WorldConfig,
};
use hybrid_a_star::utils::RecordingObserver;

fn main() {
    env_logger::init();
    println!("Hybrid A* path planning start!!");

    let car = match Car::new(VehicleConfig {
        steering_resolution: 15.0_f64.to_radians(),
        ..Default::default()
    }) {
        Ok(car) => car,
        Err(e) => {
            eprintln!("Invalid vehicle: {}", e);
            return;
        }
    };

    let config = WorldConfig {
        limits: Limits::new(0.0, 30.0, 0.0, 20.0),
        start: Pose2D::new(3.0, 4.0, 0.0),
        goal: Pose2D::new(17.0, 15.0, FRAC_PI_2),
        heuristic: HeuristicKind::Euclidean,
        goal_tolerance: GoalTolerance::Distance {
            position: 1.0,
            yaw: 20.0_f64.to_radians(),
        },
        parallel_expansion: true,
        ..Default::default()
    };
    let world = match ParkingLot::new(config, car) {
        Ok(world) => world,
        Err(e) => {
            eprintln!("Invalid world: {}", e);
            return;
        }
    };

    // Row of parked cars with one slot left free at x = 17
    let mut obstacles = Vec::new();
    for &x in &[8.0, 11.0, 14.0, 20.0, 23.0, 26.0] {
        match Rectangle::new(Point2D::new(x, 16.0), 1.8, 4.7, 0.0) {
            Ok(rect) => obstacles.push(rect),
            Err(e) => eprintln!("Skipping parked car at x = {}: {}", x, e),
        }
    }
    // Island in the middle of the lane
    if let Ok(rect) = Rectangle::new(Point2D::new(15.0, 6.0), 8.0, 2.0, 0.0) {
        obstacles.push(rect);
    }
    println!("Created {} obstacles", obstacles.len());
    let world = world.with_obstacles(obstacles);

    let planner_config = PlannerConfig {
        open_capacity: 50_000,
        closed_capacity: 50_000,
        max_iterations: Some(20_000),
        ..Default::default()
    };
    let mut planner = match HybridAStarPlanner::new(&world, planner_config) {
        Ok(planner) => planner,
        Err(e) => {
            eprintln!("Invalid planner config: {}", e);
            return;
        }
    };

    let mut observer = RecordingObserver::new().with_candidate_limit(5_000);
    let start = world.config().start;
    let goal = world.config().goal;
    let outcome = match planner.run_with_observer(start, goal, &mut observer) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Planning failed: {}", e);
            return;
        }
    };

    let stats = planner.stats();
    println!("\n=== Results ===");
    println!(
        "Iterations: {}, expanded: {}, generated: {}",
        stats.iterations, stats.expanded, stats.generated
    );
    match &outcome {
        SearchOutcome::Succeeded(planned) => {
            println!(
                "Path found: {} poses, {} nodes, cost: {:.2}, length: {:.2}",
                planned.path.len(),
                planned.waypoints.len(),
                planned.cost,
                planned.path.total_length()
            );
        }
        SearchOutcome::Exhausted => println!("No path exists"),
        SearchOutcome::Aborted(reason) => println!("Search aborted: {:?}", reason),
    }

    let mut vis = observer.render("Hybrid A* Path Planning");
    if let Err(e) = std::fs::create_dir_all("img/path_planning") {
        eprintln!("Failed to create output directory: {}", e);
    }
    match vis.save_png("img/path_planning/hybrid_a_star_result.png", 800, 600) {
        Ok(()) => println!("\nPlot saved to: img/path_planning/hybrid_a_star_result.png"),
        Err(e) => eprintln!("Failed to save plot: {}", e),
    }
    match vis.save_svg("img/path_planning/hybrid_a_star_result.svg") {
        Ok(()) => println!("Plot saved to: img/path_planning/hybrid_a_star_result.svg"),
        Err(e) => eprintln!("Failed to save plot: {}", e),
    }

    println!("\nHybrid A* path planning finish!!");
}
