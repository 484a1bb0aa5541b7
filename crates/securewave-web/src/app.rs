//! Bevy application setup

use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};
use bevy_egui::EguiPlugin;
use bevy_picking::{prelude::MeshPickingPlugin, DefaultPickingPlugins};
use securewave_core::panel::DashboardLayout;
use securewave_scene::{
    mount_threat_scene, teardown_threat_scene, HostContainer, SceneSettings, ThreatScene,
    ThreatScenePlugin,
};

use crate::settings::load_settings;
use crate::ui::UiPlugin;

/// Used until the primary window reports a size
const FALLBACK_HOST: HostContainer = HostContainer {
    width: 800.0,
    height: 600.0,
};

/// Feature card content and the widget state behind it
#[derive(Debug, Clone, Resource, Default)]
pub struct PanelState(pub DashboardLayout);

/// UI layout state for responsive design
#[derive(Debug, Clone, Resource)]
pub struct UiLayout {
    /// Whether the feature panel column is visible
    pub show_feature_panels: bool,
    /// Current screen width
    pub screen_width: f32,
    /// Current screen height
    pub screen_height: f32,
    /// Whether we're on a small screen (mobile/tablet)
    pub is_mobile: bool,
    /// Scale factor for UI elements on mobile
    pub ui_scale: f32,
}

impl Default for UiLayout {
    fn default() -> Self {
        Self {
            show_feature_panels: true,
            screen_width: 1920.0,
            screen_height: 1080.0,
            is_mobile: false,
            ui_scale: 1.0,
        }
    }
}

impl UiLayout {
    /// Update layout based on screen dimensions
    pub fn update_for_screen(&mut self, width: f32, height: f32) {
        let was_mobile = self.is_mobile;
        self.screen_width = width;
        self.screen_height = height;

        // Consider mobile if width < 800 or if it's a portrait orientation with width < 600
        self.is_mobile = width < 800.0 || (width < height && width < 600.0);
        self.ui_scale = if self.is_mobile { 1.3 } else { 1.0 };

        // Panels collapse when switching to the narrow layout
        if self.is_mobile && !was_mobile {
            self.show_feature_panels = false;
        } else if !self.is_mobile {
            self.show_feature_panels = true;
        }
    }

    /// Width of the feature panel column
    pub fn panel_width(&self) -> f32 {
        if self.is_mobile {
            (self.screen_width * 0.85).min(350.0)
        } else {
            320.0
        }
    }
}

pub fn run() {
    let settings = load_settings();

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "SecureWave System".to_string(),
                        canvas: Some("#securewave-canvas".to_string()),
                        fit_canvas_to_parent: true,
                        prevent_default_event_handling: false,
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    // The floor plan is served from the site root
                    file_path: "".to_string(),
                    meta_check: bevy::asset::AssetMetaCheck::Never,
                    ..default()
                }),
        )
        // Picking must be added BEFORE EguiPlugin so it can detect PickingPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(MeshPickingPlugin)
        .add_plugins(EguiPlugin::default())
        .insert_resource(SceneSettings(settings))
        .init_resource::<UiLayout>()
        .init_resource::<PanelState>()
        .add_plugins(ThreatScenePlugin)
        .add_plugins(UiPlugin)
        .add_systems(Startup, mount_on_startup)
        .add_systems(Update, (sync_host_container, teardown_on_exit))
        .run();
}

/// Current size of the primary window, if it has one
pub fn window_host(window: Option<&Window>) -> HostContainer {
    window
        .map(|window| HostContainer::new(window.width(), window.height()))
        .unwrap_or(FALLBACK_HOST)
}

/// Queue a mount sized to the primary window
pub fn queue_mount(commands: &mut Commands, host: HostContainer) {
    commands.queue(move |world: &mut World| mount_threat_scene(world, host));
}

pub fn queue_teardown(commands: &mut Commands) {
    commands.queue(|world: &mut World| teardown_threat_scene(world));
}

fn mount_on_startup(mut commands: Commands, windows: Query<&Window, With<PrimaryWindow>>) {
    queue_mount(&mut commands, window_host(windows.single().ok()));
}

/// Mirror primary window resizes into the host container
fn sync_host_container(
    mut resized: MessageReader<WindowResized>,
    windows: Query<Entity, With<PrimaryWindow>>,
    host: Option<ResMut<HostContainer>>,
) {
    let Ok(primary) = windows.single() else {
        resized.clear();
        return;
    };
    let Some(latest) = resized.read().filter(|event| event.window == primary).last() else {
        return;
    };
    let Some(mut host) = host else {
        return;
    };

    let size = HostContainer::new(latest.width, latest.height);
    if *host != size {
        *host = size;
    }
}

/// Release the scene when the app shuts down
fn teardown_on_exit(
    mut commands: Commands,
    mut exit: MessageReader<AppExit>,
    scene: Option<Res<ThreatScene>>,
) {
    if exit.read().last().is_some() && scene.is_some() {
        queue_teardown(&mut commands);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_collapses_on_narrow_screens() {
        let mut layout = UiLayout::default();
        layout.update_for_screen(1280.0, 800.0);
        assert!(!layout.is_mobile);
        assert!(layout.show_feature_panels);

        layout.update_for_screen(390.0, 844.0);
        assert!(layout.is_mobile);
        assert!(!layout.show_feature_panels);
        assert_eq!(layout.ui_scale, 1.3);
        assert!(layout.panel_width() <= 350.0);
    }

    #[test]
    fn test_mobile_panel_toggle_survives_resize() {
        let mut layout = UiLayout::default();
        layout.update_for_screen(390.0, 844.0);
        layout.show_feature_panels = true;
        layout.update_for_screen(400.0, 844.0);
        assert!(layout.show_feature_panels);
    }

    #[test]
    fn test_window_host_fallback() {
        assert_eq!(window_host(None), FALLBACK_HOST);
    }
}
