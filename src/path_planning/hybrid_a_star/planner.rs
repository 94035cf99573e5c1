//! Hybrid A* search loop
//!
//! The planner pops the cheapest open node, closes it, tests it against the
//! goal and otherwise expands it through the world. Closed nodes form the
//! arena that parent keys point into, so path reconstruction is a read-only
//! walk over the closed store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::common::{DState, Path2D, PlanningError, PlanningResult, Pose2D};

use super::node::{Node, NodeStore};
use super::traits::{NullObserver, SearchObserver, World};

/// Configuration for the Hybrid A* planner
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Maximum number of distinct discrete states in the open store
    pub open_capacity: usize,
    /// Maximum number of distinct discrete states in the closed store
    pub closed_capacity: usize,
    /// Stop after this many loop iterations (None = until open is exhausted)
    pub max_iterations: Option<usize>,
    /// Log search progress every this many iterations (0 disables)
    pub log_interval: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            open_capacity: 10_000,
            closed_capacity: 10_000,
            max_iterations: None,
            log_interval: 100,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> PlanningResult<()> {
        if self.open_capacity == 0 || self.closed_capacity == 0 {
            return Err(PlanningError::InvalidConfig(
                "node store capacities must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lifecycle of a planner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    Ready,
    Searching,
    Succeeded,
    Exhausted,
    /// Stopped by the iteration budget, cancellation or a store error
    Aborted,
}

/// Why a search stopped before reaching a terminal answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    IterationLimit,
    Cancelled,
}

/// Path found by a successful search
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPath {
    /// Poses from start to goal
    pub path: Path2D,
    /// Accumulated cost (gcost) of the goal node
    pub cost: f64,
    /// Continuous states of the nodes along the path, start first
    pub waypoints: Vec<Pose2D>,
}

/// Result of a search that did not fail with an error
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Succeeded(PlannedPath),
    /// The open store emptied without reaching the goal
    Exhausted,
    Aborted(AbortReason),
}

impl SearchOutcome {
    pub fn path(&self) -> Option<&PlannedPath> {
        match self {
            SearchOutcome::Succeeded(planned) => Some(planned),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SearchOutcome::Succeeded(_))
    }
}

/// Counters collected during one search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Loop iterations, i.e. pops from the open store
    pub iterations: usize,
    /// Nodes moved to the closed store and expanded
    pub expanded: usize,
    /// Collision-free successors produced by the world
    pub generated: usize,
    /// Successors that superseded a costlier open node
    pub replaced: usize,
    /// Successors dropped because open already held a cheaper node
    pub discarded: usize,
    /// Pops whose discrete state was already closed
    pub closed_skips: usize,
    /// Superseded open entries skipped while popping
    pub stale_skips: usize,
}

/// Hybrid A* planner over a borrowed world
pub struct HybridAStarPlanner<'w, W: World> {
    world: &'w W,
    config: PlannerConfig,
    open: NodeStore,
    closed: NodeStore,
    state: PlannerState,
    stats: SearchStats,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'w, W: World> HybridAStarPlanner<'w, W> {
    pub fn new(world: &'w W, config: PlannerConfig) -> PlanningResult<Self> {
        config.validate()?;
        Ok(Self {
            world,
            open: NodeStore::new(config.open_capacity),
            closed: NodeStore::new(config.closed_capacity),
            config,
            state: PlannerState::Ready,
            stats: SearchStats::default(),
            cancel: None,
        })
    }

    pub fn with_defaults(world: &'w W) -> PlanningResult<Self> {
        Self::new(world, PlannerConfig::default())
    }

    /// Abort the search once `flag` becomes true
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    /// Counters from the most recent search
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Nodes closed by the most recent search
    pub fn closed(&self) -> &NodeStore {
        &self.closed
    }

    /// Plan between the world's configured start and goal poses
    pub fn plan(&mut self) -> PlanningResult<SearchOutcome> {
        let start = self.world.start_pose();
        let goal = self.world.goal_pose();
        self.run(start, goal)
    }

    pub fn run(&mut self, start: Pose2D, goal: Pose2D) -> PlanningResult<SearchOutcome> {
        self.run_with_observer(start, goal, &mut NullObserver)
    }

    /// Run a search, reporting progress to a rendering collaborator
    pub fn run_with_observer(
        &mut self,
        start: Pose2D,
        goal: Pose2D,
        observer: &mut dyn SearchObserver,
    ) -> PlanningResult<SearchOutcome> {
        let start = start.normalized();
        let goal = goal.normalized();
        self.open = NodeStore::new(self.config.open_capacity);
        self.closed = NodeStore::new(self.config.closed_capacity);
        self.stats = SearchStats::default();
        self.state = PlannerState::Searching;

        info!(
            "Hybrid A* search from ({:.2}, {:.2}, {:.2}) to ({:.2}, {:.2}, {:.2})",
            start.x, start.y, start.yaw, goal.x, goal.y, goal.yaw
        );
        observer.on_world(&self.world.snapshot());

        let result = self.search(start, goal, observer);
        self.stats.stale_skips = self.open.stale_skips();
        self.state = match &result {
            Ok(SearchOutcome::Succeeded(_)) => PlannerState::Succeeded,
            Ok(SearchOutcome::Exhausted) => PlannerState::Exhausted,
            Ok(SearchOutcome::Aborted(reason)) => {
                warn!("Search aborted ({:?}) after {} iterations", reason, self.stats.iterations);
                PlannerState::Aborted
            }
            Err(e) => {
                warn!("Search failed after {} iterations: {}", self.stats.iterations, e);
                PlannerState::Aborted
            }
        };
        result
    }

    fn search(
        &mut self,
        start: Pose2D,
        goal: Pose2D,
        observer: &mut dyn SearchObserver,
    ) -> PlanningResult<SearchOutcome> {
        let start_node = Node::start(
            start,
            self.world.discretize(&start),
            self.world.heuristic_cost(&start, &goal),
        );
        self.open.push(start_node)?;

        while !self.open.is_empty() {
            if let Some(reason) = self.budget_exceeded() {
                return Ok(SearchOutcome::Aborted(reason));
            }
            self.stats.iterations += 1;
            let interval = self.config.log_interval;
            if interval > 0 && self.stats.iterations % interval == 0 {
                debug!(
                    "Iteration: {}, Open set size: {}, Closed set size: {}",
                    self.stats.iterations,
                    self.open.len(),
                    self.closed.len()
                );
            }

            let node = self.open.pop()?;
            let key = node.dstate();
            if self.closed.contains(&key) {
                self.stats.closed_skips += 1;
                continue;
            }
            let reached = self.world.is_goal(node.cstate(), &goal);
            self.closed.push(node)?;

            if reached {
                let planned = self.reconstruct(key)?;
                info!(
                    "Find goal after {} iterations! cost {:.3}, {} poses",
                    self.stats.iterations,
                    planned.cost,
                    planned.path.len()
                );
                observer.on_path(&planned.path);
                return Ok(SearchOutcome::Succeeded(planned));
            }

            self.expand(key, &goal, observer)?;
        }

        info!(
            "Open set is empty after {} iterations, no path found",
            self.stats.iterations
        );
        Ok(SearchOutcome::Exhausted)
    }

    fn budget_exceeded(&self) -> Option<AbortReason> {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Some(AbortReason::Cancelled);
            }
        }
        match self.config.max_iterations {
            Some(limit) if self.stats.iterations >= limit => Some(AbortReason::IterationLimit),
            _ => None,
        }
    }

    /// Merge the successors of the closed node `key` into the open store
    fn expand(
        &mut self,
        key: DState,
        goal: &Pose2D,
        observer: &mut dyn SearchObserver,
    ) -> PlanningResult<()> {
        let successors = match self.closed.get(&key) {
            Some(node) => self.world.generate_successors(node, goal),
            None => return Err(PlanningError::KeyNotFound(key)),
        };
        self.stats.expanded += 1;

        for successor in successors {
            self.stats.generated += 1;
            let dstate = successor.dstate();
            if self.closed.contains(&dstate) {
                continue;
            }
            observer.on_candidate(successor.history());

            match self.open.get(&dstate).map(Node::fcost) {
                Some(existing) if existing <= successor.fcost() => {
                    self.stats.discarded += 1;
                }
                Some(_) => {
                    self.open.replace(&dstate, successor)?;
                    self.stats.replaced += 1;
                }
                None => self.open.push(successor)?,
            }
        }
        Ok(())
    }

    /// Walk parent keys from `goal_key` back to the start node
    fn reconstruct(&self, goal_key: DState) -> PlanningResult<PlannedPath> {
        let mut chain = Vec::new();
        let mut cursor = Some(goal_key);
        while let Some(key) = cursor {
            let node = self
                .closed
                .get(&key)
                .ok_or(PlanningError::KeyNotFound(key))?;
            chain.push(node);
            cursor = node.parent();
        }
        chain.reverse();

        let cost = chain.last().map(|n| n.gcost()).unwrap_or(0.0);
        let waypoints: Vec<Pose2D> = chain.iter().map(|n| *n.cstate()).collect();
        let mut poses: Vec<Pose2D> = Vec::new();
        for node in &chain {
            if node.is_start() {
                poses.push(*node.cstate());
            } else {
                // the first history pose repeats the parent's cstate
                let skip = if poses.is_empty() { 0 } else { 1 };
                poses.extend(node.history().iter().skip(skip));
            }
        }

        Ok(PlannedPath {
            path: Path2D::from_poses(poses),
            cost,
            waypoints,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_planning::hybrid_a_star::{
        Car, Limits, ParkingLot, Rectangle, VehicleConfig, WorldConfig,
    };
    use crate::common::Point2D;
    use std::f64::consts::FRAC_PI_4;

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

    #[test]
    fn test_straight_corridor() {
        let world = corridor();
        let mut planner = HybridAStarPlanner::with_defaults(&world).unwrap();
        assert_eq!(planner.state(), PlannerState::Ready);

        let outcome = planner.plan().unwrap();
        assert_eq!(planner.state(), PlannerState::Succeeded);
        let planned = outcome.path().unwrap();
        assert!((planned.cost - 8.0).abs() < 1e-6);
        assert_eq!(planned.waypoints.len(), 9);
        assert_eq!(planned.path.first(), Some(&world.start_pose()));
        for pose in &planned.path.poses {
            assert!((pose.y - 5.5).abs() < 1e-9);
        }
        // consecutive poses are one integration step apart, no duplicates
        for pair in planned.path.poses.windows(2) {
            assert!(pair[1].x > pair[0].x);
        }
        assert!((planned.path.total_length() - planned.cost).abs() < 1e-6);
        assert_eq!(planner.stats().expanded, 8);
    }

    #[test]
    fn test_history_chain_invariant() {
        let world = corridor();
        let mut planner = HybridAStarPlanner::with_defaults(&world).unwrap();
        planner.plan().unwrap();
        for node in planner.closed().nodes() {
            if let Some(parent_key) = node.parent() {
                let parent = planner.closed().get(&parent_key).unwrap();
                let first = node.history()[0];
                let last = node.history()[node.history().len() - 1];
                assert!(first.position().distance(&parent.cstate().position()) < 1e-9);
                assert_eq!(last, *node.cstate());
            } else {
                assert!(node.history().is_empty());
            }
        }
    }

    #[test]
    fn test_iteration_limit() {
        let world = corridor();
        let config = PlannerConfig {
            max_iterations: Some(1),
            ..Default::default()
        };
        let mut planner = HybridAStarPlanner::new(&world, config).unwrap();
        let outcome = planner.plan().unwrap();
        assert_eq!(outcome, SearchOutcome::Aborted(AbortReason::IterationLimit));
        assert_eq!(planner.state(), PlannerState::Aborted);
        assert_eq!(planner.stats().iterations, 1);
    }

    #[test]
    fn test_cancel_flag() {
        let world = corridor();
        let flag = Arc::new(AtomicBool::new(true));
        let mut planner = HybridAStarPlanner::with_defaults(&world)
            .unwrap()
            .with_cancel_flag(flag);
        let outcome = planner.plan().unwrap();
        assert_eq!(outcome, SearchOutcome::Aborted(AbortReason::Cancelled));
        assert_eq!(planner.stats().iterations, 0);
    }

    #[test]
    fn test_open_capacity_aborts_search() {
        let world = corridor();
        let config = PlannerConfig {
            open_capacity: 1,
            ..Default::default()
        };
        let mut planner = HybridAStarPlanner::new(&world, config).unwrap();
        let result = planner.plan();
        assert_eq!(result, Err(PlanningError::CapacityExceeded { capacity: 1 }));
        assert_eq!(planner.state(), PlannerState::Aborted);
    }

    #[test]
    fn test_invalid_planner_config() {
        let world = corridor();
        let config = PlannerConfig {
            closed_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            HybridAStarPlanner::new(&world, config),
            Err(PlanningError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_boxed_in_start_is_exhausted() {
        let walls = vec![
            Rectangle::new(Point2D::new(5.5, 8.0), 6.0, 1.0, 0.0).unwrap(),
            Rectangle::new(Point2D::new(5.5, 3.0), 6.0, 1.0, 0.0).unwrap(),
            Rectangle::new(Point2D::new(3.0, 5.5), 1.0, 6.0, 0.0).unwrap(),
            Rectangle::new(Point2D::new(8.0, 5.5), 1.0, 6.0, 0.0).unwrap(),
        ];
        let world = corridor().with_obstacles(walls);
        let mut planner = HybridAStarPlanner::with_defaults(&world).unwrap();
        let outcome = planner
            .run(Pose2D::new(5.5, 5.5, 0.0), Pose2D::new(9.5, 1.0, 0.0))
            .unwrap();
        assert_eq!(outcome, SearchOutcome::Exhausted);
        assert_eq!(planner.state(), PlannerState::Exhausted);
        assert!(planner.stats().expanded > 0);
    }
}
