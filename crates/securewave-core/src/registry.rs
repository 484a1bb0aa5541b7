//! Registry of live threat markers and their visuals
//!
//! The registry is the only index from a threat id to whatever represents it
//! in the scene graph. It keeps threats in creation order so the UI and the
//! removal pass see a stable sequence.

use std::collections::HashMap;
use thiserror::Error;

use crate::threat::{Threat, ThreatId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("threat id already tracked: {0}")]
    DuplicateId(ThreatId),
}

/// A tracked threat together with its visual handle
#[derive(Debug, Clone)]
pub struct TrackedMarker<V> {
    pub threat: Threat,
    pub visual: V,
}

#[derive(Debug, Clone)]
pub struct MarkerRegistry<V> {
    order: Vec<ThreatId>,
    markers: HashMap<ThreatId, TrackedMarker<V>>,
}

impl<V> Default for MarkerRegistry<V> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            markers: HashMap::new(),
        }
    }
}

impl<V> MarkerRegistry<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a threat; the id must not already be tracked
    pub fn insert(&mut self, threat: Threat, visual: V) -> Result<(), RegistryError> {
        if self.markers.contains_key(&threat.id) {
            return Err(RegistryError::DuplicateId(threat.id));
        }
        self.order.push(threat.id.clone());
        self.markers
            .insert(threat.id.clone(), TrackedMarker { threat, visual });
        Ok(())
    }

    /// Stop tracking a threat, handing back its visual for disposal
    pub fn remove(&mut self, id: &ThreatId) -> Option<TrackedMarker<V>> {
        let marker = self.markers.remove(id)?;
        self.order.retain(|tracked| tracked != id);
        Some(marker)
    }

    pub fn get(&self, id: &ThreatId) -> Option<&TrackedMarker<V>> {
        self.markers.get(id)
    }

    pub fn contains(&self, id: &ThreatId) -> bool {
        self.markers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Tracked ids in creation order
    pub fn ids(&self) -> &[ThreatId] {
        &self.order
    }

    /// Tracked markers in creation order
    pub fn iter(&self) -> impl Iterator<Item = &TrackedMarker<V>> {
        self.order.iter().filter_map(|id| self.markers.get(id))
    }

    /// Remove every marker, oldest first
    pub fn drain(&mut self) -> Vec<TrackedMarker<V>> {
        let order = std::mem::take(&mut self.order);
        let mut drained = Vec::with_capacity(order.len());
        for id in order {
            if let Some(marker) = self.markers.remove(&id) {
                drained.push(marker);
            }
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threat::{ThreatCategory, ThreatLevel};

    fn threat(id: &str) -> Threat {
        Threat {
            id: ThreatId(id.to_string()),
            position: [0.0, 1.0, 0.0],
            category: ThreatCategory::Motion,
            level: ThreatLevel::Low,
        }
    }

    #[test]
    fn test_insert_and_remove() {
        let mut registry = MarkerRegistry::new();
        registry.insert(threat("a"), 1u32).unwrap();
        registry.insert(threat("b"), 2u32).unwrap();
        assert_eq!(registry.len(), 2);

        let removed = registry.remove(&ThreatId("a".to_string())).unwrap();
        assert_eq!(removed.visual, 1);
        assert!(!registry.contains(&ThreatId("a".to_string())));
        assert_eq!(registry.ids(), &[ThreatId("b".to_string())]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = MarkerRegistry::new();
        registry.insert(threat("a"), 1u32).unwrap();
        let err = registry.insert(threat("a"), 2u32).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId(ThreatId("a".to_string())));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&ThreatId("a".to_string())).unwrap().visual, 1);
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let mut registry: MarkerRegistry<u32> = MarkerRegistry::new();
        assert!(registry.remove(&ThreatId("ghost".to_string())).is_none());
    }

    #[test]
    fn test_drain_in_creation_order() {
        let mut registry = MarkerRegistry::new();
        for (i, id) in ["c", "a", "b"].iter().enumerate() {
            registry.insert(threat(id), i).unwrap();
        }
        let drained: Vec<usize> = registry.drain().into_iter().map(|m| m.visual).collect();
        assert_eq!(drained, vec![0, 1, 2]);
        assert!(registry.is_empty());
        assert!(registry.ids().is_empty());
    }
}
