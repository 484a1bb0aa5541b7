//! Synthetic threat generation
//!
//! Each synthesis tick may produce one new threat and independently rolls a
//! removal draw for every tracked threat. The simulator only decides; the
//! scene layer owns the visuals and applies the outcome.

use serde::{Deserialize, Serialize};

use crate::draws::DrawSource;
use crate::threat::{Threat, ThreatCategory, ThreatId, ThreatLevel};

/// Axis-aligned box that new threats are sampled from (max is exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnBounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Default for SpawnBounds {
    fn default() -> Self {
        Self {
            min: [-4.0, 0.5, -4.0],
            max: [4.0, 2.5, 4.0],
        }
    }
}

impl SpawnBounds {
    pub fn contains(&self, p: [f32; 3]) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    pub fn is_valid(&self) -> bool {
        (0..3).all(|i| self.min[i] < self.max[i])
    }
}

/// Tunables for the synthesis timer and marker appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Synthesis timer period
    pub period_ms: u64,
    /// Chance that a tick produces a new threat
    pub spawn_probability: f64,
    /// Per-threat chance of being removed on each tick
    pub removal_probability: f64,
    /// A draw above this makes the threat high
    pub high_threshold: f64,
    /// Otherwise, a second draw above this makes it medium
    pub medium_threshold: f64,
    pub bounds: SpawnBounds,
    pub marker_radius: f32,
    /// Sphere sectors and stacks
    pub marker_segments: u32,
    /// Pulse phase advance per elapsed millisecond
    pub pulse_speed: f64,
    pub pulse_magnitude: f32,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            period_ms: 2000,
            spawn_probability: 0.7,
            removal_probability: 0.1,
            high_threshold: 0.7,
            medium_threshold: 0.3,
            bounds: SpawnBounds::default(),
            marker_radius: 0.2,
            marker_segments: 32,
            pulse_speed: 0.05,
            pulse_magnitude: 0.2,
            seed: None,
        }
    }
}

/// Result of one synthesis tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub spawned: Option<Threat>,
    pub removed: Vec<ThreatId>,
}

/// Decides which threats appear and disappear
pub struct ThreatSimulator {
    config: SimulationConfig,
    draws: Box<dyn DrawSource>,
}

impl ThreatSimulator {
    pub fn new(config: SimulationConfig, draws: Box<dyn DrawSource>) -> Self {
        Self { config, draws }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Swap the draw source (used to force outcomes)
    pub fn set_draws(&mut self, draws: Box<dyn DrawSource>) {
        self.draws = draws;
    }

    /// Roll the spawn draw and, on success, build a new threat
    ///
    /// Draw order: spawn, x, y, z, category, level (one or two draws).
    pub fn synthesize(&mut self, timestamp_ms: i64) -> Option<Threat> {
        if !self.draws.chance(self.config.spawn_probability) {
            return None;
        }

        let bounds = self.config.bounds;
        let position = [
            self.draws.range(bounds.min[0], bounds.max[0]),
            self.draws.range(bounds.min[1], bounds.max[1]),
            self.draws.range(bounds.min[2], bounds.max[2]),
        ];
        let category = if self.draws.unit() > 0.5 {
            ThreatCategory::Motion
        } else {
            ThreatCategory::Presence
        };
        let level = self.draw_level();

        Some(Threat {
            id: self.next_id(timestamp_ms),
            position,
            category,
            level,
        })
    }

    /// Fresh id for a threat created at `timestamp_ms`
    pub fn next_id(&mut self, timestamp_ms: i64) -> ThreatId {
        ThreatId::new(timestamp_ms, self.draws.suffix())
    }

    fn draw_level(&mut self) -> ThreatLevel {
        if self.draws.unit() > self.config.high_threshold {
            ThreatLevel::High
        } else if self.draws.unit() > self.config.medium_threshold {
            ThreatLevel::Medium
        } else {
            ThreatLevel::Low
        }
    }

    /// Roll the removal draw for one tracked threat
    pub fn should_remove(&mut self) -> bool {
        self.draws.chance(self.config.removal_probability)
    }

    /// Run a full tick against the currently tracked ids
    ///
    /// A threat spawned in this tick is part of the removal pass, so it can
    /// vanish in the same tick it appeared. A new id never repeats a tracked one.
    pub fn tick(&mut self, tracked: &[ThreatId], timestamp_ms: i64) -> TickOutcome {
        let mut spawned = self.synthesize(timestamp_ms);
        if let Some(threat) = spawned.as_mut() {
            while tracked.contains(&threat.id) {
                threat.id = self.next_id(timestamp_ms);
            }
        }

        let mut removed = Vec::new();
        for id in tracked.iter().chain(spawned.as_ref().map(|t| &t.id)) {
            if self.should_remove() {
                removed.push(id.clone());
            }
        }

        TickOutcome { spawned, removed }
    }
}

/// Uniform scale of a pulsing marker at a point in time
pub fn pulse_scale(initial: f32, elapsed_ms: f64, speed: f64, magnitude: f32) -> f32 {
    initial + (elapsed_ms * speed).sin() as f32 * magnitude
}
