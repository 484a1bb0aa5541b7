//! Dashboard configuration loading and validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::simulation::SimulationConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} must be within [0, 1], got {value}")]
    Probability { field: &'static str, value: f64 },
    #[error("spawn bounds are empty or inverted: min {min:?}, max {max:?}")]
    Bounds { min: [f32; 3], max: [f32; 3] },
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub floor_plan: FloorPlanConfig,
}

/// Camera, background and lighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Background color as 0xRRGGBB
    pub background: u32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub camera_position: [f32; 3],
    pub ambient_intensity: f32,
    pub directional_intensity: f32,
    /// Direction the directional light shines from
    pub directional_position: [f32; 3],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: 0x1a1a2e,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            camera_position: [5.0, 5.0, 5.0],
            ambient_intensity: 0.5,
            directional_intensity: 0.8,
            directional_position: [1.0, 1.0, 1.0],
        }
    }
}

/// Orbit camera controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    /// Pan in the camera's screen plane instead of the ground plane
    pub screen_space_panning: bool,
    /// Maximum angle from straight up, in degrees
    pub max_polar_angle_degrees: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            screen_space_panning: false,
            max_polar_angle_degrees: 90.0,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            min_distance: 1.0,
            max_distance: 50.0,
        }
    }
}

/// Floor plan asset and the fallback ground used when it fails to load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorPlanConfig {
    /// Asset path, relative to the asset root
    pub path: String,
    pub scale: f32,
    pub offset: [f32; 3],
    /// Edge length of the fallback grid and ground plane
    pub fallback_size: f32,
    pub fallback_divisions: u32,
    pub grid_center_color: u32,
    pub grid_color: u32,
    pub ground_color: u32,
}

impl Default for FloorPlanConfig {
    fn default() -> Self {
        Self {
            path: "placeholder.glb".to_string(),
            scale: 2.0,
            offset: [0.0, -1.0, 0.0],
            fallback_size: 10.0,
            fallback_divisions: 10,
            grid_center_color: 0x444444,
            grid_color: 0x888888,
            ground_color: 0x333333,
        }
    }
}

impl DashboardConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        for (field, value) in [
            ("simulation.spawn_probability", sim.spawn_probability),
            ("simulation.removal_probability", sim.removal_probability),
            ("simulation.high_threshold", sim.high_threshold),
            ("simulation.medium_threshold", sim.medium_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { field, value });
            }
        }

        if !sim.bounds.is_valid() {
            return Err(ConfigError::Bounds {
                min: sim.bounds.min,
                max: sim.bounds.max,
            });
        }

        if sim.period_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "simulation.period_ms",
                reason: "synthesis period must be non-zero".to_string(),
            });
        }

        if sim.marker_radius <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "simulation.marker_radius",
                reason: format!("must be positive, got {}", sim.marker_radius),
            });
        }

        if sim.marker_segments < 3 {
            return Err(ConfigError::Invalid {
                field: "simulation.marker_segments",
                reason: format!("need at least 3, got {}", sim.marker_segments),
            });
        }

        if self.scene.near <= 0.0 || self.scene.far <= self.scene.near {
            return Err(ConfigError::Invalid {
                field: "scene.near",
                reason: format!("need 0 < near < far, got {} / {}", self.scene.near, self.scene.far),
            });
        }

        if self.controls.min_distance <= 0.0 || self.controls.max_distance < self.controls.min_distance {
            return Err(ConfigError::Invalid {
                field: "controls.min_distance",
                reason: "need 0 < min_distance <= max_distance".to_string(),
            });
        }

        if self.floor_plan.fallback_divisions == 0 {
            return Err(ConfigError::Invalid {
                field: "floor_plan.fallback_divisions",
                reason: "must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}
