//! The simulation engine: one robot entity in a world of obstacles and markers.
//!
//! [`SimEngine`] owns the [`World`] and everything its systems share ([`Scene`]). Callers drive
//! it with [`SimEngine::apply_command`] and [`SimEngine::step`], and read the robot's senses
//! back with [`SimEngine::read_all`].

use std::time::Duration;

use crossbeam_channel::Receiver;
use tracing::{debug, info};

use crate::{
    config::SimConfig,
    domain::{
        Actuators, Angle, Command, Environment, ImuReading, LaserScan, Marker, MarkerBoard,
        MarkerId, Obstacle, Odometry, PlacementRules, Pose, Position, SensorData,
    },
    ecs::{
        Body, Camera, Component, DiffDriveWheels, DiffDriveWheelsEncoders, Entity, Imu, Lidar,
        World,
    },
    error::{PlacementError, SimError},
    noise::NoiseGenerator,
    runner::CommandPolicy,
    systems::{
        apply_command, DiffDriveKinematics, EncoderSystem, GetInput, ImuSystem,
        IntegrateAndCollide, LidarSystem, MarkerVisibility,
    },
};

/// State shared by every system: the static environment, the markers, the noise source and the
/// actuator echo.
#[derive(Debug)]
pub struct Scene {
    pub environment: Environment,
    pub markers: MarkerBoard,
    pub placement: PlacementRules,
    pub noise: NoiseGenerator,
    pub actuators: Actuators,
}

impl Scene {
    pub fn new(environment: Environment, placement: PlacementRules, noise: NoiseGenerator) -> Self {
        Self {
            environment,
            markers: MarkerBoard::default(),
            placement,
            noise,
            actuators: Actuators::default(),
        }
    }
}

pub struct SimEngine {
    world: World<Scene>,
    robot: Entity,
    config: SimConfig,
}

impl SimEngine {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        Self::build(config, None)
    }

    /// Engine whose first system pulls commands from `commands` on every step.
    pub fn with_command_source(
        config: SimConfig,
        commands: Receiver<Command>,
        policy: CommandPolicy,
    ) -> Result<Self, SimError> {
        Self::build(config, Some(GetInput::new(commands, policy)))
    }

    fn build(config: SimConfig, input: Option<GetInput>) -> Result<Self, SimError> {
        config.validate()?;
        let scene = Scene::new(
            Environment::new(config.arena, config.obstacles.clone()),
            config.markers.rules.clone(),
            NoiseGenerator::new(config.random_seed),
        );
        let mut world = World::new(scene);
        let robot = world.create_entity(robot_components(&config))?;

        if let Some(input) = input {
            world.add_system(input);
        }
        world.add_system(DiffDriveKinematics);
        world.add_system(EncoderSystem::new(config.encoders.noise_stddev));
        world.add_system(IntegrateAndCollide);
        world.add_system(ImuSystem::new(
            config.imu.noise_stddev,
            config.imu.dt_epsilon,
        ));
        world.add_system(LidarSystem);
        world.add_system(MarkerVisibility);

        let mut engine = Self {
            world,
            robot,
            config,
        };
        for [x, y] in engine.config.markers.initial.clone() {
            engine
                .place_marker(Some(Position::new(x, y)))
                .map_err(|err| SimError::InvalidConfig(format!("initial marker: {err}")))?;
        }
        info!(
            systems = ?engine.world.system_names(),
            obstacles = engine.environment().obstacles().len(),
            markers = engine.markers().len(),
            "simulation engine ready"
        );
        Ok(engine)
    }

    /// Updates the wheel targets and the actuator echo. Fields the command leaves out keep their
    /// current value.
    pub fn apply_command(&mut self, command: &Command) {
        debug!(?command, "applying command");
        let (wheels, scene) = self.world.split_mut::<DiffDriveWheels>(self.robot);
        match wheels {
            Some(wheels) => apply_command(command, wheels, &mut scene.actuators),
            None => scene.actuators.apply(command),
        }
    }

    /// Advances the simulation by `dt` seconds and returns the resulting snapshot.
    pub fn step(&mut self, dt: f64) -> SensorData {
        self.world.step(dt);
        self.read_all()
    }

    /// Advances by one `period` and sleeps the rest of it. Returns the time spent stepping.
    pub fn step_realtime(&mut self, period: Duration) -> Duration {
        self.world.step_realtime(period)
    }

    /// Places a marker at `at`, or at a random free spot when `None`. A failure leaves the
    /// markers untouched.
    pub fn place_marker(&mut self, at: Option<Position>) -> Result<MarkerId, PlacementError> {
        let robot = self.robot_pose().position;
        let Scene {
            environment,
            markers,
            placement,
            noise,
            ..
        } = self.world.resources_mut();
        match at {
            Some(position) => markers.place_at(environment, placement, position),
            None => markers.place_random(environment, placement, robot, noise),
        }
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        info!(?obstacle, "obstacle added");
        self.world.resources_mut().environment.add_obstacle(obstacle);
    }

    /// Adds an obstacle given as `[x_min, x_max, y_min, y_max]`.
    pub fn add_obstacle_coords(&mut self, coordinates: &[f64]) -> Result<(), SimError> {
        let obstacle = Obstacle::try_from(coordinates)?;
        self.add_obstacle(obstacle);
        Ok(())
    }

    pub fn read_all(&self) -> SensorData {
        let scene = self.world.resources();
        let mut data = SensorData {
            time: self.world.time(),
            gripper_state: scene.actuators.gripper.as_str().to_string(),
            manipulator_preset: scene.actuators.manipulator_preset.clone(),
            ..Default::default()
        };
        if let Some(body) = self.world.get::<Body>(self.robot) {
            data.odom = Odometry {
                x: body.pose.position.x(),
                y: body.pose.position.y(),
                yaw: body.pose.heading.radians(),
                vx: body.vx,
                vy: body.vy,
                yaw_rate: body.wz,
            };
        }
        if let Some(lidar) = self.world.get::<Lidar>(self.robot) {
            data.scan = LaserScan {
                ranges: lidar.ranges.clone(),
                angle_min: lidar.angle_min,
                angle_max: lidar.angle_max,
                angle_increment: lidar.angle_increment(),
                range_max: lidar.max_range,
            };
        }
        if let Some(encoders) = self.world.get::<DiffDriveWheelsEncoders>(self.robot) {
            data.joints.positions = [encoders.left_angle, encoders.right_angle];
            data.joints.velocities = [encoders.left, encoders.right];
        }
        if let Some(imu) = self.world.get::<Imu>(self.robot) {
            data.imu = ImuReading {
                yaw_rate: imu.yaw_rate,
                forward_accel: imu.forward_accel,
                lateral_accel: imu.lateral_accel,
            };
        }
        if let Some(camera) = self.world.get::<Camera>(self.robot) {
            data.markers = camera.detections.clone();
        }
        data
    }

    /// Puts the robot back on its start pose with zeroed actuation, clears markers and restarts
    /// the clock. Obstacles stay; marker ids keep increasing.
    pub fn reset(&mut self) -> Result<(), SimError> {
        for component in robot_components(&self.config) {
            self.world.insert(self.robot, component)?;
        }
        let scene = self.world.resources_mut();
        scene.markers.clear();
        scene.actuators = Actuators::default();
        self.world.reset_time();
        info!("simulation reset");
        Ok(())
    }

    pub fn time(&self) -> f64 {
        self.world.time()
    }

    pub fn robot(&self) -> Entity {
        self.robot
    }

    pub fn robot_pose(&self) -> Pose {
        self.world
            .get::<Body>(self.robot)
            .map(|body| body.pose)
            .unwrap_or_else(|| self.config.robot.start.into())
    }

    pub fn robot_radius(&self) -> f64 {
        self.config.robot.radius
    }

    pub fn environment(&self) -> &Environment {
        &self.world.resources().environment
    }

    pub fn markers(&self) -> &[Marker] {
        self.world.resources().markers.markers()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> &World<Scene> {
        &self.world
    }
}

fn robot_components(config: &SimConfig) -> [Component; 6] {
    let start: Pose = config.robot.start.into();
    let lidar = &config.lidar;
    let camera = &config.camera;
    [
        Body::new(start.position, start.heading, config.robot.radius).into(),
        DiffDriveWheels::new(config.robot.wheel_radius, config.robot.wheel_base).into(),
        DiffDriveWheelsEncoders::default().into(),
        Imu::default().into(),
        Lidar::new(
            lidar.num_rays,
            lidar.angle_min,
            lidar.angle_max,
            lidar.max_range,
            lidar.step,
            lidar.step_jitter,
        )
        .into(),
        Camera::new(
            Angle::from_deg(camera.fov_deg),
            camera.range,
            camera.occlusion_resolution,
        )
        .into(),
    ]
}
