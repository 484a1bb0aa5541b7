//! Floor plan loading and the fallback ground

use bevy::asset::LoadState;
use bevy::prelude::*;
use securewave_core::config::FloorPlanConfig;
use securewave_core::threat::hex_to_rgb;

use crate::manager::ThreatScene;

/// Line thickness of the fallback grid
const GRID_LINE_THICKNESS: f32 = 0.01;

/// Marker component for the loaded floor plan model
#[derive(Component)]
pub struct FloorPlanModel;

/// Marker component for the fallback grid (lines are its children)
#[derive(Component)]
pub struct GridHelper;

/// Marker component for the fallback ground plane
#[derive(Component)]
pub struct GroundPlane;

/// Entities and assets of the fallback ground
#[derive(Debug)]
pub struct FallbackGround {
    pub grid: Entity,
    pub plane: Entity,
    meshes: Vec<Handle<Mesh>>,
    materials: Vec<Handle<StandardMaterial>>,
}

/// Where the scene's ground reference comes from
#[derive(Debug)]
pub enum FloorPlanState {
    /// glTF requested, not loaded yet
    Loading(Handle<Gltf>),
    /// Floor plan model spawned
    Loaded(Entity),
    /// Load failed (or no asset server); grid and plane spawned instead
    Fallback(FallbackGround),
}

impl FloorPlanState {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    /// Release whatever this state spawned
    pub fn dispose(
        self,
        commands: &mut Commands,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<StandardMaterial>,
    ) {
        match self {
            Self::Loading(_) => {}
            Self::Loaded(entity) => {
                if let Ok(mut entity) = commands.get_entity(entity) {
                    entity.try_despawn();
                }
            }
            Self::Fallback(ground) => {
                for entity in [ground.grid, ground.plane] {
                    if let Ok(mut entity) = commands.get_entity(entity) {
                        entity.try_despawn();
                    }
                }
                for mesh in &ground.meshes {
                    meshes.remove(mesh);
                }
                for material in &ground.materials {
                    materials.remove(material);
                }
            }
        }
    }
}

fn ground_color(hex: u32) -> Color {
    let [r, g, b] = hex_to_rgb(hex);
    Color::srgb(r, g, b)
}

/// Spawn a grid helper and a flat double-sided plane under the scene root
pub fn spawn_fallback_ground(
    root: Entity,
    config: &FloorPlanConfig,
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) -> FallbackGround {
    let size = config.fallback_size;
    let half = size / 2.0;
    let divisions = config.fallback_divisions;
    let step = size / divisions as f32;

    let center_material = materials.add(StandardMaterial {
        base_color: ground_color(config.grid_center_color),
        unlit: true,
        ..default()
    });
    let line_material = materials.add(StandardMaterial {
        base_color: ground_color(config.grid_color),
        unlit: true,
        ..default()
    });
    // Lines along X and along Z
    let line_mesh_x = meshes.add(Cuboid::new(size, GRID_LINE_THICKNESS, GRID_LINE_THICKNESS));
    let line_mesh_z = meshes.add(Cuboid::new(GRID_LINE_THICKNESS, GRID_LINE_THICKNESS, size));

    let grid = commands
        .spawn((
            GridHelper,
            Transform::default(),
            Visibility::default(),
            Name::new("grid-helper"),
            ChildOf(root),
        ))
        .id();

    for i in 0..=divisions {
        let offset = -half + i as f32 * step;
        let material = if 2 * i == divisions {
            center_material.clone()
        } else {
            line_material.clone()
        };

        commands.spawn((
            Mesh3d(line_mesh_x.clone()),
            MeshMaterial3d(material.clone()),
            Transform::from_xyz(0.0, 0.0, offset),
            ChildOf(grid),
        ));
        commands.spawn((
            Mesh3d(line_mesh_z.clone()),
            MeshMaterial3d(material),
            Transform::from_xyz(offset, 0.0, 0.0),
            ChildOf(grid),
        ));
    }

    let plane_mesh = meshes.add(Plane3d::default().mesh().size(size, size));
    let plane_material = materials.add(StandardMaterial {
        base_color: ground_color(config.ground_color),
        double_sided: true,
        cull_mode: None,
        ..default()
    });

    // Slightly below the grid so the lines stay visible
    let plane = commands
        .spawn((
            Mesh3d(plane_mesh.clone()),
            MeshMaterial3d(plane_material.clone()),
            Transform::from_xyz(0.0, -0.01, 0.0),
            GroundPlane,
            Name::new("ground-plane"),
            ChildOf(root),
        ))
        .id();

    FallbackGround {
        grid,
        plane,
        meshes: vec![line_mesh_x, line_mesh_z, plane_mesh],
        materials: vec![center_material, line_material, plane_material],
    }
}

pub struct FloorPlanPlugin;

impl Plugin for FloorPlanPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            poll_floor_plan.run_if(resource_exists::<ThreatScene>),
        );
    }
}

/// Check the floor plan load and spawn the model or the fallback ground
fn poll_floor_plan(
    mut commands: Commands,
    mut scene: ResMut<ThreatScene>,
    asset_server: Option<Res<AssetServer>>,
    gltf_assets: Option<Res<Assets<Gltf>>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let FloorPlanState::Loading(handle) = &scene.floor_plan else {
        return;
    };
    let Some(asset_server) = asset_server else {
        return;
    };

    let handle = handle.clone();
    let root = scene.root;
    let config = scene.config.floor_plan.clone();

    match asset_server.get_load_state(handle.id()) {
        Some(LoadState::Loaded) => {
            let scene_handle = gltf_assets
                .as_ref()
                .and_then(|assets| assets.get(&handle))
                .and_then(|gltf| {
                    gltf.default_scene
                        .clone()
                        .or_else(|| gltf.scenes.first().cloned())
                });

            match scene_handle {
                Some(scene_handle) => {
                    let entity = commands
                        .spawn((
                            SceneRoot(scene_handle),
                            Transform::from_translation(Vec3::from_array(config.offset))
                                .with_scale(Vec3::splat(config.scale)),
                            FloorPlanModel,
                            Name::new("floor-plan"),
                            ChildOf(root),
                        ))
                        .id();
                    tracing::info!(path = %config.path, "Floor plan loaded");
                    scene.floor_plan = FloorPlanState::Loaded(entity);
                }
                None => {
                    tracing::error!(path = %config.path, "Floor plan has no scenes, using fallback ground");
                    let ground = spawn_fallback_ground(root, &config, &mut commands, &mut meshes, &mut materials);
                    scene.floor_plan = FloorPlanState::Fallback(ground);
                }
            }
        }
        Some(LoadState::Failed(err)) => {
            tracing::error!(path = %config.path, %err, "Failed to load floor plan, using fallback ground");
            let ground = spawn_fallback_ground(root, &config, &mut commands, &mut meshes, &mut materials);
            scene.floor_plan = FloorPlanState::Fallback(ground);
        }
        _ => {}
    }
}
