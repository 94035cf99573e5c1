//! Vehicle model for Hybrid A*
//!
//! Implements a kinematic bicycle model integrated with RK4 and the
//! motion primitive library derived from it. The library is computed once
//! in the vehicle's local frame and instanced at arbitrary poses by a rigid
//! transform, without re-integration.

use log::debug;
use nalgebra::{Rotation2, Vector3};

use crate::common::{normalize_angle, PlanningError, PlanningResult, Pose2D};

use super::traits::Vehicle;

/// Slack when comparing accumulated arc length against its target [m]
const ARC_LENGTH_TOLERANCE: f64 = 1e-9;

/// Control action held constant while integrating a primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringAction {
    /// Signed speed [m/s], negative when reversing
    pub speed: f64,
    /// Steering angle [rad], positive turns counter-clockwise
    pub steering: f64,
}

impl SteeringAction {
    pub fn new(speed: f64, steering: f64) -> Self {
        Self { speed, steering }
    }
}

/// Short feasible path segment produced by one fixed action
#[derive(Debug, Clone, PartialEq)]
pub struct MotionPrimitive {
    poses: Vec<Pose2D>,
    cost: f64,
    action: SteeringAction,
}

impl MotionPrimitive {
    pub fn poses(&self) -> &[Pose2D] {
        &self.poses
    }

    pub fn into_poses(self) -> Vec<Pose2D> {
        self.poses
    }

    pub fn start_pose(&self) -> Pose2D {
        self.poses[0]
    }

    pub fn end_pose(&self) -> Pose2D {
        self.poses[self.poses.len() - 1]
    }

    /// Traversal cost, the travelled arc length scaled by any direction penalty
    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn action(&self) -> SteeringAction {
        self.action
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    /// Always false: primitives hold at least their start pose
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Rigidly move a local-frame primitive so that it starts at `pose`
    pub fn instance(&self, pose: &Pose2D) -> Self {
        let rotation = Rotation2::new(pose.yaw);
        let offset = pose.position().to_vector();
        let poses = self
            .poses
            .iter()
            .map(|local| {
                let p = rotation * local.position().to_vector() + offset;
                Pose2D::new(p.x, p.y, normalize_angle(local.yaw + pose.yaw))
            })
            .collect();
        Self {
            poses,
            cost: self.cost,
            action: self.action,
        }
    }
}

/// Vehicle configuration
#[derive(Debug, Clone)]
pub struct VehicleConfig {
    /// Footprint length along the heading [m]
    pub length: f64,
    /// Footprint width [m]
    pub width: f64,
    /// Wheelbase [m]
    pub wheelbase: f64,
    /// Integration time step [s]
    pub sample_time: f64,
    /// Steering angle resolution [rad]
    pub steering_resolution: f64,
    /// Symmetric steering angle limit [rad]
    pub steering_limit: f64,
    /// Target arc length of a motion primitive [m]
    pub primitive_length: f64,
    /// Speed magnitude used to integrate primitives [m/s]
    pub speed: f64,
    /// Also generate primitives driving backwards
    pub allow_reverse: bool,
    /// Cost multiplier for reverse primitives (>= 1)
    pub reverse_penalty: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            length: 4.7,
            width: 1.8,
            wheelbase: 2.8,
            sample_time: 0.1,
            steering_resolution: 10.0_f64.to_radians(),
            steering_limit: 45.0_f64.to_radians(),
            primitive_length: 2.0,
            speed: 1.0,
            allow_reverse: false,
            reverse_penalty: 2.0,
        }
    }
}

impl VehicleConfig {
    /// Number of steering angles in the library, per driving direction
    pub fn primitive_count(&self) -> usize {
        // slack keeps e.g. 0.6 / 0.2 from flooring to 2
        (self.steering_limit / self.steering_resolution + 1e-9).floor() as usize
    }

    /// Steering angles evenly spaced over [-limit, limit]
    pub fn steering_angles(&self) -> Vec<f64> {
        let count = self.primitive_count();
        if count == 1 {
            return vec![0.0];
        }
        (0..count)
            .map(|i| {
                -self.steering_limit + 2.0 * self.steering_limit * i as f64 / (count - 1) as f64
            })
            .collect()
    }

    pub fn validate(&self) -> PlanningResult<()> {
        let positive = [
            ("length", self.length),
            ("width", self.width),
            ("wheelbase", self.wheelbase),
            ("sample_time", self.sample_time),
            ("steering_resolution", self.steering_resolution),
            ("steering_limit", self.steering_limit),
            ("primitive_length", self.primitive_length),
            ("speed", self.speed),
        ];
        for (name, value) in positive.iter() {
            if !value.is_finite() || *value <= 0.0 {
                return Err(PlanningError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.steering_limit >= std::f64::consts::FRAC_PI_2 {
            return Err(PlanningError::InvalidConfig(format!(
                "steering_limit must be below pi/2, got {}",
                self.steering_limit
            )));
        }
        let penalty_ok = self.reverse_penalty.is_finite() && self.reverse_penalty >= 1.0;
        if self.allow_reverse && !penalty_ok {
            return Err(PlanningError::InvalidConfig(format!(
                "reverse_penalty must be at least 1, got {}",
                self.reverse_penalty
            )));
        }
        if self.primitive_count() == 0 {
            return Err(PlanningError::InvalidConfig(format!(
                "steering limit {} with resolution {} yields no motion primitives",
                self.steering_limit, self.steering_resolution
            )));
        }
        Ok(())
    }
}

/// Car-like vehicle with a precomputed motion primitive library
#[derive(Debug, Clone)]
pub struct Car {
    config: VehicleConfig,
    library: Vec<MotionPrimitive>,
}

impl Car {
    pub fn new(config: VehicleConfig) -> PlanningResult<Self> {
        config.validate()?;
        let library = Self::build_library(&config);
        debug!(
            "Built {} motion primitives ({} poses each at most)",
            library.len(),
            library.iter().map(MotionPrimitive::len).max().unwrap_or(0)
        );
        Ok(Self { config, library })
    }

    pub fn with_defaults() -> PlanningResult<Self> {
        Self::new(VehicleConfig::default())
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    /// Primitives in the local frame at the zero pose
    pub fn library(&self) -> &[MotionPrimitive] {
        &self.library
    }

    fn build_library(config: &VehicleConfig) -> Vec<MotionPrimitive> {
        let mut directions = vec![(config.speed, 1.0)];
        if config.allow_reverse {
            directions.push((-config.speed, config.reverse_penalty));
        }

        let mut library = Vec::new();
        for (speed, penalty) in directions {
            for steering in config.steering_angles() {
                let action = SteeringAction::new(speed, steering);
                let (poses, travelled) = Self::integrate_primitive(config, &action);
                library.push(MotionPrimitive {
                    poses,
                    cost: travelled * penalty,
                    action,
                });
            }
        }
        library
    }

    /// Integrate from the zero pose until the target arc length is covered
    fn integrate_primitive(
        config: &VehicleConfig,
        action: &SteeringAction,
    ) -> (Vec<Pose2D>, f64) {
        let mut state = Pose2D::origin();
        let mut poses = vec![state];
        let mut travelled = 0.0;
        while travelled + ARC_LENGTH_TOLERANCE < config.primitive_length {
            let next = Self::rk4_step(config, &state, action);
            travelled += state.position().distance(&next.position());
            poses.push(next);
            state = next;
        }
        (poses, travelled)
    }

    fn rk4_step(config: &VehicleConfig, state: &Pose2D, action: &SteeringAction) -> Pose2D {
        let h = config.sample_time;
        let x = state.to_vector();
        let k1 = Self::dynamics(config, &x, action) * h;
        let k2 = Self::dynamics(config, &(x + k1 * 0.5), action) * h;
        let k3 = Self::dynamics(config, &(x + k2 * 0.5), action) * h;
        let k4 = Self::dynamics(config, &(x + k3), action) * h;
        let next = x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) / 6.0;
        Pose2D::from(next).normalized()
    }

    /// Single track bicycle model. The turn rate uses |v / L| so a positive
    /// steering angle turns counter-clockwise in both driving directions.
    fn dynamics(
        config: &VehicleConfig,
        q: &Vector3<f64>,
        action: &SteeringAction,
    ) -> Vector3<f64> {
        let theta = q[2];
        let v = action.speed;
        Vector3::new(
            v * theta.cos(),
            v * theta.sin(),
            (v / config.wheelbase).abs() * action.steering.tan(),
        )
    }
}

impl Vehicle for Car {
    fn dimensions(&self) -> (f64, f64) {
        (self.config.length, self.config.width)
    }

    fn wheelbase(&self) -> f64 {
        self.config.wheelbase
    }

    fn sample_time(&self) -> f64 {
        self.config.sample_time
    }

    fn steering_resolution(&self) -> f64 {
        self.config.steering_resolution
    }

    fn steering_limit(&self) -> f64 {
        self.config.steering_limit
    }

    fn primitive_length(&self) -> f64 {
        self.config.primitive_length
    }

    fn step(&self, state: &Pose2D, action: &SteeringAction) -> Pose2D {
        Self::rk4_step(&self.config, state, action)
    }

    fn create_motion_primitives(&self, pose: &Pose2D) -> Vec<MotionPrimitive> {
        self.library.iter().map(|p| p.instance(pose)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn small_car_config() -> VehicleConfig {
        VehicleConfig {
            length: 0.8,
            width: 0.4,
            wheelbase: 1.0,
            sample_time: 0.1,
            steering_resolution: 0.2,
            steering_limit: 0.6,
            primitive_length: 1.0,
            speed: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_step_straight() {
        let car = Car::new(small_car_config()).unwrap();
        let next = car.step(&Pose2D::origin(), &SteeringAction::new(1.0, 0.0));
        assert_relative_eq!(next.x, 0.1, epsilon = 1e-12);
        assert_relative_eq!(next.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(next.yaw, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_step_turn_rate_sign_convention() {
        let car = Car::new(small_car_config()).unwrap();
        let start = Pose2D::origin();

        let forward_left = car.step(&start, &SteeringAction::new(1.0, 0.3));
        assert!(forward_left.yaw > 0.0);
        assert!(forward_left.x > 0.0);
        assert!(forward_left.y > 0.0);

        // reversing with the same steering still increases yaw
        let reverse_left = car.step(&start, &SteeringAction::new(-1.0, 0.3));
        assert_relative_eq!(reverse_left.yaw, forward_left.yaw, epsilon = 1e-12);
        assert!(reverse_left.x < 0.0);

        let forward_right = car.step(&start, &SteeringAction::new(1.0, -0.3));
        assert_relative_eq!(forward_right.yaw, -forward_left.yaw, epsilon = 1e-12);
    }

    #[test]
    fn test_step_is_deterministic() {
        let car = Car::with_defaults().unwrap();
        let state = Pose2D::new(1.0, -2.0, 0.7);
        let action = SteeringAction::new(1.5, -0.2);
        assert_eq!(car.step(&state, &action), car.step(&state, &action));
    }

    #[test]
    fn test_steering_angles() {
        let config = small_car_config();
        assert_eq!(config.primitive_count(), 3);
        let angles = config.steering_angles();
        assert_eq!(angles.len(), 3);
        assert_relative_eq!(angles[0], -0.6, epsilon = 1e-12);
        assert_relative_eq!(angles[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(angles[2], 0.6, epsilon = 1e-12);

        // defaults: floor(45 / 10) = 4 angles spanning the limit
        let defaults = VehicleConfig::default();
        let angles = defaults.steering_angles();
        assert_eq!(angles.len(), 4);
        assert_relative_eq!(angles[0], -FRAC_PI_4, epsilon = 1e-12);
        assert_relative_eq!(angles[3], FRAC_PI_4, epsilon = 1e-12);

        let single = VehicleConfig {
            steering_resolution: 0.5,
            steering_limit: 0.6,
            ..small_car_config()
        };
        assert_eq!(single.steering_angles(), vec![0.0]);
    }

    #[test]
    fn test_invalid_config() {
        let zero_primitives = VehicleConfig {
            steering_resolution: 0.5,
            steering_limit: 0.2,
            ..small_car_config()
        };
        assert!(matches!(
            Car::new(zero_primitives),
            Err(PlanningError::InvalidConfig(_))
        ));

        let bad_wheelbase = VehicleConfig {
            wheelbase: 0.0,
            ..small_car_config()
        };
        assert!(matches!(Car::new(bad_wheelbase), Err(PlanningError::InvalidConfig(_))));

        let bad_sample_time = VehicleConfig {
            sample_time: -0.1,
            ..small_car_config()
        };
        assert!(matches!(Car::new(bad_sample_time), Err(PlanningError::InvalidConfig(_))));

        let bad_penalty = VehicleConfig {
            allow_reverse: true,
            reverse_penalty: 0.5,
            ..small_car_config()
        };
        assert!(matches!(Car::new(bad_penalty), Err(PlanningError::InvalidConfig(_))));
    }

    #[test]
    fn test_library_shape() {
        let config = small_car_config();
        let car = Car::new(config.clone()).unwrap();
        assert_eq!(car.library().len(), 3);
        for primitive in car.library() {
            assert_eq!(primitive.start_pose(), Pose2D::origin());
            assert!(primitive.len() > 1);
            assert!(primitive.cost() >= config.primitive_length - 1e-9);
            // one extra step can overshoot by at most one sample
            let max_cost = config.primitive_length + config.speed * config.sample_time;
            assert!(primitive.cost() < max_cost + 1e-9);
        }
        let straight = &car.library()[1];
        assert_relative_eq!(straight.end_pose().x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(straight.end_pose().y, 0.0, epsilon = 1e-12);
        assert!(car.library()[0].end_pose().yaw < 0.0);
        assert!(car.library()[2].end_pose().yaw > 0.0);
    }

    #[test]
    fn test_reverse_library() {
        let config = VehicleConfig {
            allow_reverse: true,
            reverse_penalty: 2.0,
            ..small_car_config()
        };
        let car = Car::new(config).unwrap();
        assert_eq!(car.library().len(), 6);
        let forward = &car.library()[1];
        let reverse = &car.library()[4];
        assert!(reverse.action().speed < 0.0);
        assert!(reverse.end_pose().x < 0.0);
        assert_relative_eq!(reverse.cost(), 2.0 * forward.cost(), epsilon = 1e-9);
    }

    #[test]
    fn test_create_motion_primitives_at_pose() {
        let car = Car::new(small_car_config()).unwrap();
        let pose = Pose2D::new(3.0, 4.0, FRAC_PI_2);
        let primitives = car.create_motion_primitives(&pose);
        assert_eq!(primitives.len(), car.library().len());

        for (instanced, local) in primitives.iter().zip(car.library()) {
            assert_eq!(instanced.len(), local.len());
            assert_relative_eq!(instanced.cost(), local.cost(), epsilon = 1e-12);
            let start = instanced.start_pose();
            assert_relative_eq!(start.x, pose.x, epsilon = 1e-12);
            assert_relative_eq!(start.y, pose.y, epsilon = 1e-12);
            assert_relative_eq!(start.yaw, pose.yaw, epsilon = 1e-12);
        }

        // straight ahead at 90 deg moves along +y
        let end = primitives[1].end_pose();
        assert_relative_eq!(end.x, 3.0, epsilon = 1e-9);
        assert_relative_eq!(end.y, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_footprint_follows_pose() {
        let car = Car::new(small_car_config()).unwrap();
        let footprint = car.footprint(&Pose2D::new(1.0, 2.0, FRAC_PI_2));
        assert_eq!(footprint.center().x, 1.0);
        assert_eq!(footprint.center().y, 2.0);
        assert!(footprint.contains(&Pose2D::new(1.0, 2.35, 0.0).position()));
        assert!(!footprint.contains(&Pose2D::new(1.35, 2.0, 0.0).position()));
    }
}
