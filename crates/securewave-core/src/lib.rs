//! SecureWave Core - Threat model, simulation, and dashboard configuration
//!
//! This crate holds everything that does not depend on the renderer:
//! - Threat marker types and severity colors
//! - Injectable random draw sources
//! - The threat simulator deciding what spawns and what disappears
//! - The marker registry mapping threat ids to scene visuals
//! - Static dashboard panel content and TOML configuration

pub mod config;
pub mod draws;
pub mod panel;
pub mod registry;
pub mod simulation;
pub mod threat;

pub use config::{ConfigError, DashboardConfig};
pub use draws::{DrawSource, RngDraws, ScriptedDraws};
pub use registry::{MarkerRegistry, RegistryError, TrackedMarker};
pub use simulation::{SimulationConfig, SpawnBounds, ThreatSimulator, TickOutcome};
pub use threat::{Threat, ThreatCategory, ThreatId, ThreatLevel};
