//! Threat scene lifecycle: mount, synthesis step, resize and teardown
//!
//! Everything the scene owns lives in the [`ThreatScene`] resource. Systems
//! that drive the scene only run while that resource exists, so removing it
//! on teardown stops the synthesis clock and resize handling at once.

use bevy::ecs::system::SystemState;
use bevy::prelude::*;
use securewave_core::config::DashboardConfig;
use securewave_core::threat::hex_to_rgb;
use securewave_core::{
    DrawSource, MarkerRegistry, RngDraws, Threat, ThreatSimulator, TickOutcome,
};
use std::time::Duration;

use crate::camera::OrbitControls;
use crate::floor_plan::{spawn_fallback_ground, FloorPlanState};
use crate::markers::{spawn_marker, MarkerVisual, PulseTask, PulseTasks};

/// Ambient brightness per unit of configured intensity
const AMBIENT_BRIGHTNESS_SCALE: f32 = 400.0;

/// Directional illuminance (lux) per unit of configured intensity
const DIRECTIONAL_ILLUMINANCE_SCALE: f32 = 6250.0;

/// Pixel size of the element hosting the scene
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct HostContainer {
    pub width: f32,
    pub height: f32,
}

impl HostContainer {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width over height; 1.0 while the container has no height yet
    pub fn aspect_ratio(&self) -> f32 {
        if self.height > 0.0 && self.width > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Output size of the scene camera
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct RenderSurface {
    pub width: u32,
    pub height: u32,
}

impl From<HostContainer> for RenderSurface {
    fn from(host: HostContainer) -> Self {
        Self {
            width: host.width.max(0.0).round() as u32,
            height: host.height.max(0.0).round() as u32,
        }
    }
}

/// Marker component for the scene root
#[derive(Component)]
pub struct ThreatSceneRoot;

/// Marker component for the scene camera
#[derive(Component)]
pub struct ThreatSceneCamera;

/// Configuration used by the next mount
#[derive(Resource, Debug, Clone, Default)]
pub struct SceneSettings(pub DashboardConfig);

/// A mounted threat scene
#[derive(Resource)]
pub struct ThreatScene {
    pub root: Entity,
    pub camera: Entity,
    pub simulator: ThreatSimulator,
    pub registry: MarkerRegistry<MarkerVisual>,
    /// Synthesis timer
    pub clock: Timer,
    pub config: DashboardConfig,
    pub floor_plan: FloorPlanState,
}

impl ThreatScene {
    /// Number of tracked markers, as shown in the overlay
    pub fn marker_count(&self) -> usize {
        self.registry.len()
    }

    /// Tracked threats, oldest first
    pub fn threats(&self) -> impl Iterator<Item = &Threat> {
        self.registry.iter().map(|marker| &marker.threat)
    }

    /// Replace the simulator's draws (used to force outcomes)
    pub fn set_draws(&mut self, draws: Box<dyn DrawSource>) {
        self.simulator.set_draws(draws);
    }

    /// Run one synthesis tick and apply it to the scene
    pub fn synthesis_step(
        &mut self,
        now_ms: i64,
        commands: &mut Commands,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<StandardMaterial>,
        pulses: &mut PulseTasks,
    ) -> TickOutcome {
        let outcome = self.simulator.tick(self.registry.ids(), now_ms);

        if let Some(threat) = &outcome.spawned {
            let sim = self.simulator.config();
            let visual = spawn_marker(threat, self.root, sim, commands, meshes, materials);
            pulses.push(PulseTask {
                entity: visual.entity,
                initial_scale: 1.0,
                speed: sim.pulse_speed,
                magnitude: sim.pulse_magnitude,
            });

            match self.registry.insert(threat.clone(), visual.clone()) {
                Ok(()) => tracing::debug!(
                    id = %threat.id,
                    category = threat.category.label(),
                    level = threat.level.label(),
                    "Threat spawned"
                ),
                Err(err) => {
                    tracing::warn!(%err, "Dropping marker");
                    visual.dispose(commands, meshes, materials);
                }
            }
        }

        for id in &outcome.removed {
            let Some(visual) = self.registry.get(id).map(|marker| marker.visual.clone()) else {
                continue;
            };
            visual.dispose(commands, meshes, materials);
            self.registry.remove(id);
            tracing::debug!(%id, "Threat removed");
        }

        outcome
    }
}

/// Build the scene into `world`, sized to the host container
///
/// Does nothing if a scene is already mounted.
pub fn mount_threat_scene(world: &mut World, host: HostContainer) {
    if world.contains_resource::<ThreatScene>() {
        tracing::warn!("Threat scene already mounted");
        return;
    }
    if !world.contains_resource::<Assets<Mesh>>()
        || !world.contains_resource::<Assets<StandardMaterial>>()
    {
        tracing::error!("Mesh and material assets unavailable, cannot mount threat scene");
        return;
    }

    let config = world
        .get_resource::<SceneSettings>()
        .map(|settings| settings.0.clone())
        .unwrap_or_default();

    let draws: Box<dyn DrawSource> = match config.simulation.seed {
        Some(seed) => Box::new(RngDraws::seeded(seed)),
        None => Box::new(RngDraws::from_entropy()),
    };
    let simulator = ThreatSimulator::new(config.simulation.clone(), draws);

    world.insert_resource(host);

    let mut state: SystemState<(
        Commands,
        ResMut<Assets<Mesh>>,
        ResMut<Assets<StandardMaterial>>,
        Option<Res<AssetServer>>,
    )> = SystemState::new(world);
    let (root, camera, floor_plan) = {
        let (mut commands, mut meshes, mut materials, asset_server) = state.get_mut(world);

        let root = commands
            .spawn((
                ThreatSceneRoot,
                Transform::default(),
                Visibility::default(),
                Name::new("threat-scene"),
            ))
            .id();

        let scene_config = &config.scene;
        let eye = Vec3::from_array(scene_config.camera_position);
        let [r, g, b] = hex_to_rgb(scene_config.background);
        let camera = commands
            .spawn((
                Camera3d::default(),
                Camera {
                    clear_color: ClearColorConfig::Custom(Color::srgb(r, g, b)),
                    ..default()
                },
                Projection::Perspective(PerspectiveProjection {
                    fov: scene_config.fov_degrees.to_radians(),
                    aspect_ratio: host.aspect_ratio(),
                    near: scene_config.near,
                    far: scene_config.far,
                    ..default()
                }),
                Transform::from_translation(eye).looking_at(Vec3::ZERO, Vec3::Y),
                AmbientLight {
                    color: Color::WHITE,
                    brightness: scene_config.ambient_intensity * AMBIENT_BRIGHTNESS_SCALE,
                    ..default()
                },
                OrbitControls::new(eye, Vec3::ZERO, &config.controls),
                RenderSurface::from(host),
                ThreatSceneCamera,
            ))
            .id();

        commands.spawn((
            DirectionalLight {
                illuminance: scene_config.directional_intensity * DIRECTIONAL_ILLUMINANCE_SCALE,
                ..default()
            },
            Transform::from_translation(Vec3::from_array(scene_config.directional_position))
                .looking_at(Vec3::ZERO, Vec3::Y),
            ChildOf(root),
        ));

        let floor_plan = match asset_server {
            Some(asset_server) => {
                tracing::info!(path = %config.floor_plan.path, "Loading floor plan");
                FloorPlanState::Loading(asset_server.load(config.floor_plan.path.clone()))
            }
            None => {
                tracing::warn!("No asset server, using fallback ground");
                FloorPlanState::Fallback(spawn_fallback_ground(
                    root,
                    &config.floor_plan,
                    &mut commands,
                    &mut meshes,
                    &mut materials,
                ))
            }
        };

        (root, camera, floor_plan)
    };
    state.apply(world);

    let period = Duration::from_millis(config.simulation.period_ms);
    world.insert_resource(ThreatScene {
        root,
        camera,
        simulator,
        registry: MarkerRegistry::new(),
        clock: Timer::new(period, TimerMode::Repeating),
        config,
        floor_plan,
    });
    world.init_resource::<PulseTasks>();

    tracing::info!(
        width = host.width,
        height = host.height,
        period_ms = period.as_millis() as u64,
        "Threat scene mounted"
    );
}

/// Release everything the scene owns
///
/// Pulse tasks are left alone; they stop on their own once their spheres
/// are gone.
pub fn teardown_threat_scene(world: &mut World) {
    let Some(scene) = world.remove_resource::<ThreatScene>() else {
        tracing::debug!("No threat scene to tear down");
        return;
    };
    let ThreatScene {
        root,
        camera,
        mut registry,
        floor_plan,
        ..
    } = scene;

    let mut state: SystemState<(
        Commands,
        ResMut<Assets<Mesh>>,
        ResMut<Assets<StandardMaterial>>,
    )> = SystemState::new(world);
    let disposed = {
        let (mut commands, mut meshes, mut materials) = state.get_mut(world);

        let markers = registry.drain();
        let disposed = markers.len();
        for marker in markers {
            marker.visual.dispose(&mut commands, &mut meshes, &mut materials);
        }

        floor_plan.dispose(&mut commands, &mut meshes, &mut materials);

        for entity in [camera, root] {
            if let Ok(mut entity) = commands.get_entity(entity) {
                entity.try_despawn();
            }
        }
        disposed
    };

    state.apply(world);
    tracing::info!(markers = disposed, "Threat scene torn down");
}

pub struct SceneLifecyclePlugin;

impl Plugin for SceneLifecyclePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            handle_host_resize.run_if(resource_exists::<ThreatScene>),
        );
    }
}

/// Match the camera to a resized host container
fn handle_host_resize(
    host: Option<Res<HostContainer>>,
    mut cameras: Query<(&mut Projection, &mut RenderSurface), With<ThreatSceneCamera>>,
) {
    let Some(host) = host else {
        return;
    };
    if !host.is_changed() {
        return;
    }

    for (mut projection, mut surface) in cameras.iter_mut() {
        if let Projection::Perspective(perspective) = projection.as_mut() {
            perspective.aspect_ratio = host.aspect_ratio();
        }
        let resized = RenderSurface::from(*host);
        if *surface != resized {
            tracing::debug!(width = resized.width, height = resized.height, "Render surface resized");
            *surface = resized;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floor_plan::{GridHelper, GroundPlane};
    use crate::markers::ThreatMarker;
    use crate::test_support::{force_tick, scene_app, script_draws};
    use securewave_core::{ThreatCategory, ThreatLevel};

    fn marker_count(world: &mut World) -> usize {
        world.query::<&ThreatMarker>().iter(world).count()
    }

    fn root_children(world: &World, root: Entity) -> usize {
        world.get::<Children>(root).map_or(0, |children| children.len())
    }

    fn mounted_app() -> App {
        let mut app = scene_app();
        mount_threat_scene(app.world_mut(), HostContainer::new(800.0, 600.0));
        app.update();
        app
    }

    #[test]
    fn test_aspect_ratio_guards_zero_height() {
        assert_eq!(HostContainer::new(800.0, 600.0).aspect_ratio(), 800.0 / 600.0);
        assert_eq!(HostContainer::new(800.0, 0.0).aspect_ratio(), 1.0);
    }

    #[test]
    fn test_mount_builds_camera() {
        let mut app = mounted_app();
        let world = app.world_mut();
        let (projection, surface, transform, camera) = world
            .query_filtered::<(&Projection, &RenderSurface, &Transform, &Camera), With<ThreatSceneCamera>>()
            .single(world)
            .unwrap();

        let Projection::Perspective(perspective) = projection else {
            panic!("expected perspective projection");
        };
        assert!((perspective.fov - 75f32.to_radians()).abs() < 1e-6);
        assert_eq!(perspective.near, 0.1);
        assert_eq!(perspective.far, 1000.0);
        assert!((perspective.aspect_ratio - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(*surface, RenderSurface { width: 800, height: 600 });
        assert!(matches!(camera.clear_color, ClearColorConfig::Custom(_)));
        assert!(transform.translation.distance(Vec3::splat(5.0)) < 1e-3);
    }

    #[test]
    fn test_mount_twice_is_ignored() {
        let mut app = mounted_app();
        let root = app.world().resource::<ThreatScene>().root;
        mount_threat_scene(app.world_mut(), HostContainer::new(1024.0, 768.0));

        let world = app.world_mut();
        assert_eq!(world.resource::<ThreatScene>().root, root);
        assert_eq!(world.query::<&ThreatSceneCamera>().iter(world).count(), 1);
    }

    #[test]
    fn test_end_to_end_spawn_then_remove() {
        let mut app = mounted_app();
        {
            let world = app.world_mut();
            assert_eq!(world.resource::<ThreatScene>().marker_count(), 0);
            assert_eq!(marker_count(world), 0);
            assert_eq!(world.query::<&GridHelper>().iter(world).count(), 1);
            assert_eq!(world.query::<&GroundPlane>().iter(world).count(), 1);
        }

        // spawn, x, y, z, category, level (high), removal (keep)
        script_draws(&mut app, vec![0.0, 0.5, 0.5, 0.5, 0.9, 0.95, 0.9]);
        force_tick(&mut app);
        {
            let world = app.world_mut();
            let scene = world.resource::<ThreatScene>();
            assert_eq!(scene.marker_count(), 1);
            let threat = scene.threats().next().unwrap().clone();
            assert_eq!(threat.level, ThreatLevel::High);
            assert_eq!(threat.category, ThreatCategory::Motion);

            let markers: Vec<_> = world
                .query::<(&ThreatMarker, &MeshMaterial3d<StandardMaterial>)>()
                .iter(world)
                .map(|(marker, material)| (marker.id.clone(), material.0.clone()))
                .collect();
            assert_eq!(markers.len(), 1);
            assert_eq!(markers[0].0, threat.id);
            let material = world
                .resource::<Assets<StandardMaterial>>()
                .get(&markers[0].1)
                .unwrap();
            let color = material.base_color.to_srgba();
            assert_eq!((color.red, color.green, color.blue), (1.0, 0.0, 0.0));
        }

        // no spawn, remove the only marker
        script_draws(&mut app, vec![0.9, 0.0]);
        force_tick(&mut app);
        let world = app.world_mut();
        assert_eq!(world.resource::<ThreatScene>().marker_count(), 0);
        assert_eq!(marker_count(world), 0);
    }

    #[test]
    fn test_removal_detaches_exactly_one_child() {
        let mut app = mounted_app();
        // two ticks that each spawn and keep a marker
        script_draws(&mut app, vec![0.0, 0.5, 0.5, 0.5, 0.9, 0.95, 0.9]);
        force_tick(&mut app);
        script_draws(&mut app, vec![0.0, 0.1, 0.5, 0.1, 0.1, 0.95, 0.9, 0.9]);
        force_tick(&mut app);

        let (root, first, before) = {
            let world = app.world();
            let scene = world.resource::<ThreatScene>();
            assert_eq!(scene.marker_count(), 2);
            let first = scene.registry.ids()[0].clone();
            (scene.root, first, root_children(world, scene.root))
        };

        // no spawn, remove the first marker and keep the second
        script_draws(&mut app, vec![0.9, 0.0, 0.9]);
        force_tick(&mut app);

        let world = app.world();
        let scene = world.resource::<ThreatScene>();
        assert!(!scene.registry.contains(&first));
        assert_eq!(scene.marker_count(), 1);
        assert_eq!(root_children(world, root), before - 1);
    }

    #[test]
    fn test_spawn_can_vanish_in_same_tick() {
        let mut app = mounted_app();
        let meshes_before = app.world().resource::<Assets<Mesh>>().len();

        script_draws(&mut app, vec![0.0, 0.5, 0.5, 0.5, 0.9, 0.95, 0.0]);
        force_tick(&mut app);

        let world = app.world_mut();
        assert_eq!(world.resource::<ThreatScene>().marker_count(), 0);
        assert_eq!(marker_count(world), 0);
        assert_eq!(world.resource::<Assets<Mesh>>().len(), meshes_before);
    }

    #[test]
    fn test_teardown_clears_everything() {
        let mut app = mounted_app();
        for _ in 0..3 {
            script_draws(&mut app, vec![0.0, 0.5, 0.5, 0.5, 0.9, 0.95]);
            force_tick(&mut app);
        }
        assert_eq!(app.world().resource::<ThreatScene>().marker_count(), 3);

        teardown_threat_scene(app.world_mut());
        app.update();

        let world = app.world_mut();
        assert!(!world.contains_resource::<ThreatScene>());
        assert_eq!(marker_count(world), 0);
        assert_eq!(world.query::<&ThreatSceneRoot>().iter(world).count(), 0);
        assert_eq!(world.query::<&ThreatSceneCamera>().iter(world).count(), 0);
        assert_eq!(world.query::<&DirectionalLight>().iter(world).count(), 0);
        assert_eq!(world.resource::<Assets<Mesh>>().len(), 0);
        assert_eq!(world.resource::<Assets<StandardMaterial>>().len(), 0);
    }

    #[test]
    fn test_teardown_without_mount_is_noop() {
        let mut app = scene_app();
        teardown_threat_scene(app.world_mut());
        app.update();
        assert!(!app.world().contains_resource::<ThreatScene>());
    }

    #[test]
    fn test_remount_leaves_same_asset_counts() {
        let mut app = mounted_app();
        let meshes = app.world().resource::<Assets<Mesh>>().len();
        let materials = app.world().resource::<Assets<StandardMaterial>>().len();

        script_draws(&mut app, vec![0.0, 0.5, 0.5, 0.5, 0.9, 0.95]);
        force_tick(&mut app);
        teardown_threat_scene(app.world_mut());
        mount_threat_scene(app.world_mut(), HostContainer::new(800.0, 600.0));
        app.update();

        let world = app.world();
        assert_eq!(world.resource::<Assets<Mesh>>().len(), meshes);
        assert_eq!(world.resource::<Assets<StandardMaterial>>().len(), materials);
        assert_eq!(world.resource::<ThreatScene>().marker_count(), 0);
    }

    #[test]
    fn test_resize_updates_camera_only() {
        let mut app = mounted_app();
        script_draws(&mut app, vec![0.0, 0.5, 0.5, 0.5, 0.9, 0.95]);
        force_tick(&mut app);
        let ids = app.world().resource::<ThreatScene>().registry.ids().to_vec();

        app.insert_resource(HostContainer::new(1200.0, 400.0));
        app.update();

        let world = app.world_mut();
        let (projection, surface) = world
            .query_filtered::<(&Projection, &RenderSurface), With<ThreatSceneCamera>>()
            .single(world)
            .unwrap();
        let Projection::Perspective(perspective) = projection else {
            panic!("expected perspective projection");
        };
        assert!((perspective.aspect_ratio - 3.0).abs() < 1e-6);
        assert_eq!(*surface, RenderSurface { width: 1200, height: 400 });
        assert_eq!(world.resource::<ThreatScene>().registry.ids(), ids.as_slice());
    }

    #[test]
    fn test_seeded_scenes_spawn_identical_threats() {
        fn run(seed: u64) -> Vec<Threat> {
            let mut app = scene_app();
            let mut settings = SceneSettings::default();
            settings.0.simulation.seed = Some(seed);
            app.insert_resource(settings);
            mount_threat_scene(app.world_mut(), HostContainer::new(800.0, 600.0));
            for _ in 0..10 {
                force_tick(&mut app);
            }
            app.world()
                .resource::<ThreatScene>()
                .threats()
                .cloned()
                .collect()
        }

        let a = run(7);
        let b = run(7);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.position, y.position);
            assert_eq!(x.level, y.level);
            assert_eq!(x.category, y.category);
        }
    }
}
