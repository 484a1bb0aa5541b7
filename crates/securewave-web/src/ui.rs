//! Dashboard shell using bevy_egui

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use bevy_picking::hover::HoverMap;
use bevy_picking::pointer::PointerId;
use securewave_core::panel::{ButtonStyle, FeaturePanel, PanelControl, SystemStatus};
use securewave_core::{ThreatCategory, ThreatId, ThreatLevel};
use securewave_scene::{PointerOverUi, ThreatMarker, ThreatScene};

use crate::app::{queue_mount, queue_teardown, window_host, PanelState, UiLayout};

const ONLINE_GREEN: egui::Color32 = egui::Color32::from_rgb(34, 197, 94);
const OFFLINE_RED: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HoveredMarker>()
            .add_systems(Update, (update_ui_layout, track_hovered_marker))
            // Main UI system runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
            .add_systems(EguiPrimaryContextPass, ui_system);
    }
}

/// Marker currently under the mouse pointer
#[derive(Debug, Clone, Default, Resource)]
pub struct HoveredMarker(pub Option<HoveredThreat>);

#[derive(Debug, Clone, PartialEq)]
pub struct HoveredThreat {
    pub id: ThreatId,
    pub category: ThreatCategory,
    pub level: ThreatLevel,
}

/// Update UI layout based on window size
fn update_ui_layout(windows: Query<&Window, With<PrimaryWindow>>, mut ui_layout: ResMut<UiLayout>) {
    if let Ok(window) = windows.single() {
        let width = window.width();
        let height = window.height();

        // Only update if dimensions changed significantly
        if (ui_layout.screen_width - width).abs() > 1.0
            || (ui_layout.screen_height - height).abs() > 1.0
        {
            ui_layout.update_for_screen(width, height);
        }
    }
}

/// Resolve the mouse hover to a threat marker
fn track_hovered_marker(
    hover_map: Option<Res<HoverMap>>,
    markers: Query<&ThreatMarker>,
    mut hovered: ResMut<HoveredMarker>,
) {
    let current = hover_map
        .as_ref()
        .and_then(|map| map.get(&PointerId::Mouse))
        .and_then(|hits| hits.keys().find_map(|entity| markers.get(*entity).ok()))
        .map(|marker| HoveredThreat {
            id: marker.id.clone(),
            category: marker.category,
            level: marker.level,
        });

    if hovered.0 != current {
        hovered.0 = current;
    }
}

fn level_color(level: ThreatLevel) -> egui::Color32 {
    let hex = level.color_hex();
    egui::Color32::from_rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

#[allow(clippy::too_many_arguments)]
fn ui_system(
    mut contexts: EguiContexts,
    mut commands: Commands,
    mut panels: ResMut<PanelState>,
    mut ui_layout: ResMut<UiLayout>,
    mut pointer_over_ui: ResMut<PointerOverUi>,
    hovered: Res<HoveredMarker>,
    scene: Option<Res<ThreatScene>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    time: Res<Time>,
) {
    let is_mobile = ui_layout.is_mobile;
    let panel_width = ui_layout.panel_width();
    let ui_scale = ui_layout.ui_scale;

    // Get the egui context - early return if not available
    let Ok(ctx) = contexts.ctx_mut() else { return };

    // Set up style for mobile - larger text and touch targets
    if is_mobile {
        let mut style = (*ctx.style()).clone();
        style.spacing.button_padding = egui::vec2(12.0, 8.0);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        ctx.set_style(style);
    }

    let layout = &mut panels.0;

    // Header
    egui::TopBottomPanel::top("header").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading(egui::RichText::new(&layout.title).size(20.0 * ui_scale).strong());

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if is_mobile {
                    let text = if ui_layout.show_feature_panels { "Panels ✕" } else { "Panels" };
                    if ui.button(egui::RichText::new(text).size(16.0 * ui_scale)).clicked() {
                        ui_layout.show_feature_panels = !ui_layout.show_feature_panels;
                    }
                    ui.separator();
                }

                ui.label(layout.status.label());
                let base = match layout.status {
                    SystemStatus::Online => ONLINE_GREEN,
                    SystemStatus::Offline => OFFLINE_RED,
                };
                // Pulsing status dot
                let alpha = 0.4 + 0.6 * (time.elapsed_secs() * 2.0).sin().abs();
                ui.colored_label(base.gamma_multiply(alpha), "●");
            });
        });
    });

    // Feature panels (right side on desktop, full-width overlay on mobile)
    if !is_mobile || ui_layout.show_feature_panels {
        egui::SidePanel::right("feature_panels")
            .default_width(panel_width)
            .resizable(!is_mobile)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for panel in layout.panels.iter_mut() {
                        show_feature_panel(ui, panel, ui_scale);
                        ui.add_space(8.0);
                    }
                });
            });
    }

    // Visualization overlay
    egui::Area::new(egui::Id::new("visualization_overlay"))
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(12.0, 56.0 * ui_scale))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.strong(&layout.visualization_title);
                ui.separator();

                match scene.as_deref() {
                    Some(scene) => {
                        ui.label(format!("Threats Detected: {}", scene.marker_count()));
                    }
                    None => {
                        ui.colored_label(egui::Color32::GRAY, "Visualization paused");
                    }
                }

                if let Some(threat) = &hovered.0 {
                    ui.horizontal(|ui| {
                        ui.colored_label(level_color(threat.level), "●");
                        ui.label(format!(
                            "{} · {}",
                            capitalize_first(threat.category.label()),
                            capitalize_first(threat.level.label())
                        ));
                    });
                    ui.small(threat.id.as_str());
                }

                let text = if scene.is_some() { "Pause" } else { "Resume" };
                if ui.button(text).clicked() {
                    if scene.is_some() {
                        tracing::info!("Pausing threat visualization");
                        queue_teardown(&mut commands);
                    } else {
                        tracing::info!("Resuming threat visualization");
                        queue_mount(&mut commands, window_host(windows.single().ok()));
                    }
                }
            });
        });

    let over_ui = ctx.wants_pointer_input() || ctx.is_pointer_over_area();
    if pointer_over_ui.0 != over_ui {
        pointer_over_ui.0 = over_ui;
    }
}

/// Render one feature card; buttons have no action
fn show_feature_panel(ui: &mut egui::Ui, panel: &mut FeaturePanel, ui_scale: f32) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label(egui::RichText::new(&panel.title).size(16.0 * ui_scale).strong());
        ui.label(egui::RichText::new(&panel.description).small().weak());
        ui.add_space(4.0);

        for control in panel.controls.iter_mut() {
            let key = control.widget_key().to_string();
            ui.push_id(key, |ui| match control {
                PanelControl::Toggle { label, on, .. } => {
                    ui.checkbox(on, label.as_str());
                }
                PanelControl::Slider { label, min, max, value, .. } => {
                    ui.label(label.as_str());
                    ui.add(egui::Slider::new(value, *min..=*max).suffix("%"));
                }
                PanelControl::ReadOnly { label, value, .. } => {
                    ui.horizontal(|ui| {
                        ui.label(label.as_str());
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.strong(value.as_str());
                        });
                    });
                }
                PanelControl::Button { label, style } => {
                    let text = egui::RichText::new(label.as_str());
                    let button = match style {
                        ButtonStyle::Primary => egui::Button::new(text.color(egui::Color32::WHITE))
                            .fill(egui::Color32::from_rgb(37, 99, 235)),
                        ButtonStyle::Secondary => egui::Button::new(text),
                    };
                    if ui.add_sized([ui.available_width(), 24.0 * ui_scale], button).clicked() {
                        tracing::debug!(button = %label, "Panel button has no action");
                    }
                }
            });
        }
    });
}

/// Capitalize first letter of a string
fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}
