//! Threat marker spheres, the synthesis tick and pulse animation

use bevy::prelude::*;
use securewave_core::simulation::{pulse_scale, SimulationConfig};
use securewave_core::threat::{color_for_label, hex_to_rgb, MARKER_OPACITY};
use securewave_core::{Threat, ThreatCategory, ThreatId, ThreatLevel};

use crate::manager::ThreatScene;

/// Component carried by every marker sphere
#[derive(Component, Debug, Clone)]
pub struct ThreatMarker {
    pub id: ThreatId,
    pub category: ThreatCategory,
    pub level: ThreatLevel,
}

/// Scene-side handles of one tracked marker
#[derive(Debug, Clone)]
pub struct MarkerVisual {
    pub entity: Entity,
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

impl MarkerVisual {
    /// Despawn the sphere and free its mesh and material
    pub fn dispose(
        &self,
        commands: &mut Commands,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<StandardMaterial>,
    ) {
        if let Ok(mut entity) = commands.get_entity(self.entity) {
            entity.try_despawn();
        }
        meshes.remove(&self.mesh);
        materials.remove(&self.material);
    }
}

/// Unlit, semi-transparent material in a marker color
pub fn marker_material(color_hex: u32) -> StandardMaterial {
    let [r, g, b] = hex_to_rgb(color_hex);
    StandardMaterial {
        base_color: Color::srgba(r, g, b, MARKER_OPACITY),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    }
}

/// Marker material for a level label; unknown labels are white
pub fn marker_material_for_label(label: &str) -> StandardMaterial {
    marker_material(color_for_label(label))
}

/// Spawn the sphere for a threat under the scene root
pub fn spawn_marker(
    threat: &Threat,
    root: Entity,
    config: &SimulationConfig,
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) -> MarkerVisual {
    let mesh = meshes.add(
        Sphere::new(config.marker_radius)
            .mesh()
            .uv(config.marker_segments, config.marker_segments),
    );
    let material = materials.add(marker_material_for_label(threat.level.label()));

    let entity = commands
        .spawn((
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            Transform::from_translation(Vec3::from_array(threat.position)),
            ThreatMarker {
                id: threat.id.clone(),
                category: threat.category,
                level: threat.level,
            },
            Name::new(threat.id.to_string()),
            ChildOf(root),
        ))
        .id();

    MarkerVisual {
        entity,
        mesh,
        material,
    }
}

/// A per-frame scale animation for one sphere
#[derive(Debug, Clone, Copy)]
pub struct PulseTask {
    pub entity: Entity,
    pub initial_scale: f32,
    pub speed: f64,
    pub magnitude: f32,
}

/// Pending pulse tasks, re-enqueued each frame while their sphere is attached
#[derive(Resource, Debug, Default)]
pub struct PulseTasks {
    queue: Vec<PulseTask>,
}

impl PulseTasks {
    pub fn push(&mut self, task: PulseTask) {
        self.queue.push(task);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.queue.iter().any(|task| task.entity == entity)
    }
}

pub struct MarkersPlugin;

impl Plugin for MarkersPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PulseTasks>()
            .add_systems(
                Update,
                run_synthesis.run_if(resource_exists::<ThreatScene>),
            )
            .add_systems(Update, run_pulse_tasks.after(run_synthesis));
    }
}

/// Advance the synthesis clock and apply a tick when it fires
fn run_synthesis(
    mut commands: Commands,
    mut scene: ResMut<ThreatScene>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut pulses: ResMut<PulseTasks>,
    time: Res<Time>,
) {
    scene.clock.tick(time.delta());
    if !scene.clock.just_finished() {
        return;
    }

    let now_ms = chrono::Utc::now().timestamp_millis();
    scene.synthesis_step(
        now_ms,
        &mut commands,
        &mut meshes,
        &mut materials,
        &mut pulses,
    );
}

/// Run every queued pulse task once
///
/// A task whose sphere is gone or no longer under the scene root is dropped
/// instead of re-enqueued. This also empties the queue after teardown.
fn run_pulse_tasks(
    mut pulses: ResMut<PulseTasks>,
    scene: Option<Res<ThreatScene>>,
    time: Res<Time>,
    mut spheres: Query<(&ChildOf, &mut Transform), With<ThreatMarker>>,
) {
    if pulses.is_empty() {
        return;
    }

    let root = scene.map(|scene| scene.root);
    let elapsed_ms = time.elapsed_secs_f64() * 1000.0;

    let tasks = std::mem::take(&mut pulses.queue);
    for task in tasks {
        let Ok((child_of, mut transform)) = spheres.get_mut(task.entity) else {
            continue;
        };
        if Some(child_of.parent()) != root {
            continue;
        }

        let scale = pulse_scale(task.initial_scale, elapsed_ms, task.speed, task.magnitude);
        transform.scale = Vec3::splat(scale);
        pulses.queue.push(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::{mount_threat_scene, teardown_threat_scene, HostContainer};
    use crate::test_support::{force_tick, scene_app, script_draws};

    /// spawn, x, y, z, category, level (high), removal (keep)
    fn spawn_high_and_keep() -> Vec<f64> {
        vec![0.0, 0.5, 0.5, 0.5, 0.9, 0.95, 0.9]
    }

    #[test]
    fn test_marker_material_is_translucent() {
        let material = marker_material(0xff0000);
        assert_eq!(material.alpha_mode, AlphaMode::Blend);
        assert!(material.unlit);
        let color = material.base_color.to_srgba();
        assert_eq!((color.red, color.green, color.blue), (1.0, 0.0, 0.0));
        assert!((color.alpha - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_level_label_gets_white_marker() {
        let material = marker_material_for_label("critical");
        let color = material.base_color.to_srgba();
        assert_eq!((color.red, color.green, color.blue), (1.0, 1.0, 1.0));
        assert!((color.alpha - 0.7).abs() < 1e-6);

        let high = marker_material_for_label("High").base_color.to_srgba();
        assert_eq!((high.red, high.green, high.blue), (1.0, 0.0, 0.0));
    }

    #[test]
    fn test_spawned_marker_gets_pulse_task() {
        let mut app = scene_app();
        mount_threat_scene(app.world_mut(), HostContainer::new(800.0, 600.0));
        script_draws(&mut app, spawn_high_and_keep());
        force_tick(&mut app);

        let scene = app.world().resource::<ThreatScene>();
        let marker = scene.registry.iter().next().unwrap();
        let entity = marker.visual.entity;
        assert!(app.world().resource::<PulseTasks>().contains(entity));

        app.update();
        assert!(app.world().resource::<PulseTasks>().contains(entity));
        let scale = app.world().get::<Transform>(entity).unwrap().scale;
        assert!(scale.x >= 0.8 - 1e-5 && scale.x <= 1.2 + 1e-5);
        assert_eq!(scale.x, scale.y);
    }

    #[test]
    fn test_pulse_task_ends_after_removal() {
        let mut app = scene_app();
        mount_threat_scene(app.world_mut(), HostContainer::new(800.0, 600.0));
        script_draws(&mut app, spawn_high_and_keep());
        force_tick(&mut app);
        assert_eq!(app.world().resource::<PulseTasks>().len(), 1);

        // no spawn, remove the tracked marker
        script_draws(&mut app, vec![0.9, 0.0]);
        force_tick(&mut app);
        assert_eq!(app.world().resource::<ThreatScene>().marker_count(), 0);

        app.update();
        assert!(app.world().resource::<PulseTasks>().is_empty());
    }

    #[test]
    fn test_pulse_tasks_end_after_teardown() {
        let mut app = scene_app();
        mount_threat_scene(app.world_mut(), HostContainer::new(800.0, 600.0));
        script_draws(&mut app, spawn_high_and_keep());
        force_tick(&mut app);

        teardown_threat_scene(app.world_mut());
        app.update();
        assert!(app.world().resource::<PulseTasks>().is_empty());
    }

    #[test]
    fn test_marker_color_matches_level() {
        let mut app = scene_app();
        mount_threat_scene(app.world_mut(), HostContainer::new(800.0, 600.0));
        // medium: first level draw misses high, second beats medium
        script_draws(&mut app, vec![0.0, 0.5, 0.5, 0.5, 0.1, 0.5, 0.5, 0.9]);
        force_tick(&mut app);

        let scene = app.world().resource::<ThreatScene>();
        let marker = scene.registry.iter().next().unwrap();
        assert_eq!(marker.threat.level, ThreatLevel::Medium);
        assert_eq!(marker.threat.category, ThreatCategory::Presence);

        let materials = app.world().resource::<Assets<StandardMaterial>>();
        let material = materials.get(&marker.visual.material).unwrap();
        let color = material.base_color.to_srgba();
        assert_eq!((color.red, color.green, color.blue), (1.0, 1.0, 0.0));
    }
}
