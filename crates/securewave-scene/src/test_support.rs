//! Headless app helpers shared by the scene tests

use std::time::Duration;

use bevy::gltf::GltfPlugin;
use bevy::prelude::*;
use securewave_core::ScriptedDraws;

use crate::floor_plan::{FloorPlanPlugin, FloorPlanState};
use crate::manager::{SceneLifecyclePlugin, ThreatScene};
use crate::markers::MarkersPlugin;

/// Returned when a script runs out: no spawn, no removal
const IDLE_DRAW: f64 = 0.99;

/// Updates to wait for an asynchronous floor plan load
const LOAD_ATTEMPTS: usize = 500;

/// App with every scene system except input handling
pub(crate) fn scene_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .init_resource::<Assets<Mesh>>()
        .init_resource::<Assets<StandardMaterial>>()
        .add_plugins((SceneLifecyclePlugin, FloorPlanPlugin, MarkersPlugin));
    app
}

/// App with a real asset server reading the crate's `test-assets/` directory
pub(crate) fn asset_app() -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        AssetPlugin {
            file_path: "test-assets".to_string(),
            ..default()
        },
    ))
    .init_asset::<Mesh>()
    .init_asset::<StandardMaterial>()
    .init_asset::<Scene>()
    .add_plugins(GltfPlugin::default())
    .add_plugins((SceneLifecyclePlugin, FloorPlanPlugin, MarkersPlugin));
    // Registers the glTF loader
    app.finish();
    app.cleanup();
    app
}

/// Update until the mounted floor plan leaves the loading state
pub(crate) fn settle_floor_plan(app: &mut App) {
    for _ in 0..LOAD_ATTEMPTS {
        app.update();
        let scene = app.world().resource::<ThreatScene>();
        if !matches!(scene.floor_plan, FloorPlanState::Loading(_)) {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("floor plan still loading after {LOAD_ATTEMPTS} updates");
}

/// Replace the mounted scene's draws with a fixed script
pub(crate) fn script_draws(app: &mut App, draws: Vec<f64>) {
    app.world_mut()
        .resource_mut::<ThreatScene>()
        .set_draws(Box::new(ScriptedDraws::new(draws, IDLE_DRAW)));
}

/// Fire the synthesis timer on the next update
pub(crate) fn force_tick(app: &mut App) {
    {
        let mut scene = app.world_mut().resource_mut::<ThreatScene>();
        let period = scene.clock.duration();
        scene.clock.set_elapsed(period);
    }
    app.update();
}
