//! Orbit camera controls with damping
//!
//! The controls keep the camera on a sphere around a target point. Input only
//! accumulates deltas; [`OrbitControls::update`] applies a damped fraction of
//! them every frame, so motion eases out after the pointer is released.

use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use securewave_core::config::ControlsConfig;

use crate::manager::ThreatScene;

/// Keeps the camera off the exact pole so `looking_at` stays well defined
const MIN_POLAR_ANGLE: f32 = 1e-4;

/// Pan distance per pixel, relative to the orbit radius
const PAN_SPEED: f32 = 0.002;

/// Set by the UI layer while the pointer is over a panel
#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct PointerOverUi(pub bool);

/// Orbit controller attached to the scene camera
#[derive(Debug, Clone, Component)]
pub struct OrbitControls {
    pub target: Vec3,
    pub radius: f32,
    /// Angle from +Y
    pub polar: f32,
    /// Angle around +Y, measured from +Z towards +X
    pub azimuth: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub screen_space_panning: bool,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Pending (azimuth, polar) rotation
    rotate_delta: Vec2,
    pan_offset: Vec3,
    zoom_scale: f32,
}

impl OrbitControls {
    pub fn new(eye: Vec3, target: Vec3, config: &ControlsConfig) -> Self {
        let offset = eye - target;
        let radius = offset.length().max(f32::EPSILON);
        let polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
        let azimuth = offset.x.atan2(offset.z);

        Self {
            target,
            radius,
            polar,
            azimuth,
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor,
            screen_space_panning: config.screen_space_panning,
            max_polar_angle: config.max_polar_angle_degrees.to_radians(),
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            rotate_delta: Vec2::ZERO,
            pan_offset: Vec3::ZERO,
            zoom_scale: 1.0,
        }
    }

    /// Queue a rotation from a pointer drag in pixels
    pub fn rotate(&mut self, drag: Vec2) {
        self.rotate_delta.x -= drag.x * self.rotate_speed;
        self.rotate_delta.y -= drag.y * self.rotate_speed;
    }

    /// Queue a pan from a pointer drag in pixels
    ///
    /// Without screen-space panning the vertical drag moves the target along
    /// the ground, never up or down.
    pub fn pan(&mut self, drag: Vec2) {
        let right = Vec3::new(self.azimuth.cos(), 0.0, -self.azimuth.sin());
        let up = if self.screen_space_panning {
            let eye_dir = (self.eye() - self.target).normalize_or_zero();
            eye_dir.cross(right).normalize_or_zero()
        } else {
            Vec3::new(-self.azimuth.sin(), 0.0, -self.azimuth.cos())
        };
        let speed = self.radius * PAN_SPEED;
        self.pan_offset += (-right * drag.x + up * drag.y) * speed;
    }

    /// Queue a zoom from scroll wheel lines (positive zooms in)
    pub fn zoom(&mut self, scroll: f32) {
        let factor = (1.0 - scroll * self.zoom_speed).clamp(0.1, 10.0);
        self.zoom_scale *= factor;
    }

    /// Scale the radius directly (pinch gestures)
    pub fn zoom_by(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.zoom_scale *= factor;
        }
    }

    pub fn eye(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        self.target
            + Vec3::new(
                self.radius * sin_polar * self.azimuth.sin(),
                self.radius * self.polar.cos(),
                self.radius * sin_polar * self.azimuth.cos(),
            )
    }

    /// Advance one frame and return the camera transform
    pub fn update(&mut self) -> Transform {
        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        self.azimuth += self.rotate_delta.x * factor;
        self.polar = (self.polar + self.rotate_delta.y * factor)
            .clamp(MIN_POLAR_ANGLE, self.max_polar_angle);
        self.radius = (self.radius * self.zoom_scale).clamp(self.min_distance, self.max_distance);
        self.zoom_scale = 1.0;
        self.target += self.pan_offset * factor;

        if self.enable_damping {
            self.rotate_delta *= 1.0 - factor;
            self.pan_offset *= 1.0 - factor;
        } else {
            self.rotate_delta = Vec2::ZERO;
            self.pan_offset = Vec3::ZERO;
        }

        Transform::from_translation(self.eye()).looking_at(self.target, Vec3::Y)
    }
}

/// Plugin for camera controls
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PointerOverUi>().add_systems(
            Update,
            (read_orbit_input, update_orbit_controls)
                .chain()
                .run_if(resource_exists::<ThreatScene>),
        );
    }
}

/// Feed mouse and touch input into the controls
fn read_orbit_input(
    mut controls: Query<&mut OrbitControls>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    pointer_over_ui: Res<PointerOverUi>,
) {
    let mut total_motion = Vec2::ZERO;
    for motion in mouse_motion.read() {
        total_motion += motion.delta;
    }
    let scroll: f32 = mouse_wheel.read().map(|wheel| wheel.y).sum();

    if pointer_over_ui.0 {
        return;
    }

    for mut orbit in controls.iter_mut() {
        if mouse_button.pressed(MouseButton::Left) {
            orbit.rotate(total_motion);
        }
        if mouse_button.pressed(MouseButton::Right) {
            orbit.pan(total_motion);
        }
        if scroll != 0.0 {
            orbit.zoom(scroll);
        }

        let touches: Vec<_> = touch_input.iter().collect();
        match touches.as_slice() {
            [touch] => orbit.rotate(touch.delta()),
            [t1, t2] => {
                let curr_dist = t1.position().distance(t2.position());
                let prev_dist = (t1.position() - t1.delta()).distance(t2.position() - t2.delta());
                orbit.zoom_by(prev_dist / curr_dist.max(1.0));
            }
            _ => {}
        }
    }
}

/// Apply damping and move the camera, once per frame
fn update_orbit_controls(mut cameras: Query<(&mut OrbitControls, &mut Transform)>) {
    for (mut orbit, mut transform) in cameras.iter_mut() {
        *transform = orbit.update();
    }
}
