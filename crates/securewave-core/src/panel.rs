//! Static content of the dashboard shell
//!
//! The header indicator and feature cards carry no control logic. Toggles and
//! sliders only remember what the user set them to; buttons do nothing.

use serde::{Deserialize, Serialize};

/// Overall system status shown in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    #[default]
    Online,
    Offline,
}

impl SystemStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Online => "System Online",
            Self::Offline => "System Offline",
        }
    }
}

/// Visual emphasis of a panel button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Primary,
    Secondary,
}

/// A single control inside a feature card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelControl {
    Toggle { id: String, label: String, on: bool },
    Slider { id: String, label: String, min: f32, max: f32, value: f32 },
    ReadOnly { id: String, label: String, value: String },
    Button { label: String, style: ButtonStyle },
}

impl PanelControl {
    fn toggle(id: &str, label: &str, on: bool) -> Self {
        Self::Toggle { id: id.to_string(), label: label.to_string(), on }
    }

    fn slider(id: &str, label: &str, min: f32, max: f32, value: f32) -> Self {
        Self::Slider { id: id.to_string(), label: label.to_string(), min, max, value }
    }

    fn read_only(id: &str, label: &str, value: &str) -> Self {
        Self::ReadOnly { id: id.to_string(), label: label.to_string(), value: value.to_string() }
    }

    fn button(label: &str, style: ButtonStyle) -> Self {
        Self::Button { label: label.to_string(), style }
    }
}

/// A titled card in the feature column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePanel {
    pub title: String,
    pub description: String,
    pub controls: Vec<PanelControl>,
}

/// Everything the dashboard shell shows besides the 3D view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardLayout {
    pub title: String,
    pub status: SystemStatus,
    pub visualization_title: String,
    pub panels: Vec<FeaturePanel>,
}

impl Default for DashboardLayout {
    fn default() -> Self {
        Self {
            title: "SecureWave System".to_string(),
            status: SystemStatus::Online,
            visualization_title: "Offline Threat Visualization".to_string(),
            panels: vec![
                FeaturePanel {
                    title: "See-Through Detection".to_string(),
                    description: "Advanced mmWave sensors penetrate walls and physical barriers \
                        to detect even the slightest human motion or still presence."
                        .to_string(),
                    controls: vec![
                        PanelControl::toggle("detection-switch", "Detection Active", true),
                        PanelControl::slider("sensitivity", "Sensitivity Level", 0.0, 100.0, 75.0),
                    ],
                },
                FeaturePanel {
                    title: "Multifactor Secure Control".to_string(),
                    description: "The base unit's command access is protected by robust \
                        three-factor authentication (key, RFID, fingerprint) ensuring \
                        tamper-proof system management."
                        .to_string(),
                    controls: vec![
                        PanelControl::read_only("key-status", "Key Status", "Connected"),
                        PanelControl::read_only("rfid-status", "RFID Reader", "Active"),
                        PanelControl::read_only("fingerprint-status", "Fingerprint Scanner", "Calibrated"),
                        PanelControl::button("Manage Access", ButtonStyle::Primary),
                    ],
                },
                FeaturePanel {
                    title: "Always-On Resilience".to_string(),
                    description: "Features 12-hour battery backup and automatic wireless \
                        failover guaranteeing uninterrupted security even if lines are cut."
                        .to_string(),
                    controls: vec![
                        PanelControl::read_only("battery-level", "Battery Level", "95%"),
                        PanelControl::read_only("failover-status", "Wireless Failover", "Ready"),
                        PanelControl::button("Run Diagnostics", ButtonStyle::Secondary),
                    ],
                },
            ],
        }
    }
}

impl PanelControl {
    /// Key that scopes the control's widget state: its id, or the label for buttons
    pub fn widget_key(&self) -> &str {
        match self {
            Self::Toggle { id, .. } | Self::Slider { id, .. } | Self::ReadOnly { id, .. } => id,
            Self::Button { label, .. } => label,
        }
    }
}
