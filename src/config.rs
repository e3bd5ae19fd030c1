//! Simulator configuration, loaded from TOML. Every field has a default, so a partial file (or
//! no file at all) is valid.

use std::{f64::consts::PI, fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{
    domain::{Angle, Arena, Obstacle, PlacementRules, Pose, Position},
    error::SimError,
    runner::CommandPolicy,
};

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub arena: Arena,
    pub robot: RobotConfig,
    pub lidar: LidarConfig,
    pub camera: CameraConfig,
    pub imu: ImuConfig,
    pub encoders: EncoderConfig,
    pub markers: MarkerConfig,
    /// `[x_min, x_max, y_min, y_max]` per obstacle.
    pub obstacles: Vec<Obstacle>,
    pub runner: RunnerConfig,
    /// 0 seeds the noise from OS entropy.
    pub random_seed: u64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub radius: f64,
    pub wheel_radius: f64,
    pub wheel_base: f64,
    pub start: StartPose,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            radius: 0.3,
            wheel_radius: 1.0,
            wheel_base: 0.3,
            start: StartPose::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StartPose {
    pub x: f64,
    pub y: f64,
    /// Radians.
    pub heading: f64,
}

impl From<StartPose> for Pose {
    fn from(value: StartPose) -> Self {
        Pose::new(
            Position::new(value.x, value.y),
            Angle::new(value.heading).normalized(),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LidarConfig {
    pub num_rays: usize,
    pub angle_min: f64,
    pub angle_max: f64,
    pub max_range: f64,
    pub step: f64,
    pub step_jitter: f64,
}

impl Default for LidarConfig {
    fn default() -> Self {
        Self {
            num_rays: 72,
            angle_min: -PI,
            angle_max: PI,
            max_range: 4.0,
            step: 0.05,
            step_jitter: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_deg: f64,
    pub range: f64,
    pub occlusion_resolution: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 60.0,
            range: 3.0,
            occlusion_resolution: 0.05,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImuConfig {
    pub noise_stddev: f64,
    pub dt_epsilon: f64,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            noise_stddev: 0.02,
            dt_epsilon: 1e-6,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub noise_stddev: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    #[serde(flatten)]
    pub rules: PlacementRules,
    /// Markers placed at construction, as `[x, y]`.
    pub initial: Vec<[f64; 2]>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub sim_rate_hz: f64,
    pub publish_rate_hz: f64,
    pub command_policy: CommandPolicy,
    /// Snapshots kept for slow readers before the oldest is dropped.
    pub sensor_buffer: usize,
    pub shutdown_timeout_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            sim_rate_hz: 100.0,
            publish_rate_hz: 10.0,
            command_policy: CommandPolicy::default(),
            sensor_buffer: 8,
            shutdown_timeout_ms: 1000,
        }
    }
}

impl RunnerConfig {
    pub fn sim_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.sim_rate_hz)
    }

    pub fn publish_period(&self) -> f64 {
        1.0 / self.publish_rate_hz
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), SimError> {
    if condition {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(message()))
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Positive and with a period that fits in a [`Duration`].
fn positive_rate(hz: f64) -> bool {
    positive(hz) && Duration::try_from_secs_f64(1.0 / hz).is_ok()
}

impl SimConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, SimError> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Demo scene shipped in `configs/demo.toml`: three boxes and a marker in a 10 m arena.
    pub fn demo() -> Result<Self, SimError> {
        Self::from_toml_str(include_str!("../configs/demo.toml"))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let arena = &self.arena;
        ensure(
            arena.x_min < arena.x_max && arena.y_min < arena.y_max,
            || format!("arena {arena:?} is empty"),
        )?;
        ensure(positive(self.robot.radius), || {
            format!("robot radius {} must be positive", self.robot.radius)
        })?;
        ensure(
            positive(self.robot.wheel_radius) && positive(self.robot.wheel_base),
            || {
                format!(
                    "wheel radius {} and wheel base {} must be positive",
                    self.robot.wheel_radius, self.robot.wheel_base
                )
            },
        )?;
        ensure(self.lidar.num_rays > 0, || "lidar needs at least one ray".into())?;
        ensure(
            positive(self.lidar.step) && positive(self.lidar.max_range),
            || {
                format!(
                    "lidar step {} and max range {} must be positive",
                    self.lidar.step, self.lidar.max_range
                )
            },
        )?;
        ensure(
            self.lidar.angle_min.is_finite() && self.lidar.angle_max.is_finite(),
            || "lidar angles must be finite".into(),
        )?;
        ensure(self.lidar.angle_min <= self.lidar.angle_max, || {
            format!(
                "lidar angle_min {} exceeds angle_max {}",
                self.lidar.angle_min, self.lidar.angle_max
            )
        })?;
        ensure(
            positive(self.camera.fov_deg) && self.camera.fov_deg <= 360.0,
            || format!("camera fov {} deg must be in (0, 360]", self.camera.fov_deg),
        )?;
        ensure(
            positive(self.camera.range) && positive(self.camera.occlusion_resolution),
            || "camera range and occlusion resolution must be positive".into(),
        )?;
        ensure(
            self.imu.noise_stddev >= 0.0 && self.encoders.noise_stddev >= 0.0,
            || "noise standard deviations must not be negative".into(),
        )?;
        ensure(
            positive_rate(self.runner.sim_rate_hz) && positive_rate(self.runner.publish_rate_hz),
            || {
                format!(
                    "sim rate {} Hz and publish rate {} Hz must be positive",
                    self.runner.sim_rate_hz, self.runner.publish_rate_hz
                )
            },
        )?;
        ensure(self.runner.sensor_buffer > 0, || {
            "sensor buffer must hold at least one snapshot".into()
        })?;
        Ok(())
    }
}
