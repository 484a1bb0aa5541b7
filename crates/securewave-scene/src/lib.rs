//! SecureWave Scene - The threat visualization as Bevy plugins
//!
//! This crate mounts the 3D threat scene into a Bevy world:
//! - Camera, lights and orbit controls
//! - Floor plan loading with a fallback ground
//! - Periodic threat synthesis and pulsing markers
//! - Resize handling and full teardown

pub mod camera;
pub mod floor_plan;
pub mod manager;
pub mod markers;

#[cfg(test)]
pub(crate) mod test_support;

use bevy::prelude::*;

/// Plugin that drives a mounted threat scene
///
/// Mounting itself is explicit, see [`mount_threat_scene`].
pub struct ThreatScenePlugin;

impl Plugin for ThreatScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(camera::CameraPlugin)
            .add_plugins(manager::SceneLifecyclePlugin)
            .add_plugins(floor_plan::FloorPlanPlugin)
            .add_plugins(markers::MarkersPlugin);
    }
}

// Re-export commonly used types
pub use camera::{OrbitControls, PointerOverUi};
pub use manager::{
    mount_threat_scene, teardown_threat_scene, HostContainer, RenderSurface, SceneSettings,
    ThreatScene, ThreatSceneCamera, ThreatSceneRoot,
};
pub use markers::{PulseTasks, ThreatMarker};
