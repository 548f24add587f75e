// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Registry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ordered boundary sequence. Position in the sequence is the boundary
//! index; nodes store index + 1. Indices are only stable between mutations.

use crate::boundary::BoundaryHandle;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct BoundaryRegistry {
    boundaries: Vec<BoundaryHandle>,
    /// Bumped on every mutation.
    generation: u64,
}

impl BoundaryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append; overlapping geometries are allowed.
    pub fn add(&mut self, boundary: BoundaryHandle) {
        self.boundaries.push(boundary);
        self.generation += 1;
    }

    /// Remove the first entry identical to `boundary`.
    /// Returns false (and leaves the registry untouched) if absent.
    pub fn remove(&mut self, boundary: &BoundaryHandle) -> bool {
        match self.position(boundary) {
            Some(i) => {
                self.boundaries.remove(i);
                self.generation += 1;
                true
            }
            None => false,
        }
    }

    /// 0-based index of `boundary`, by handle identity.
    pub fn position(&self, boundary: &BoundaryHandle) -> Option<usize> {
        self.boundaries.iter().position(|b| Arc::ptr_eq(b, boundary))
    }

    pub fn contains(&self, boundary: &BoundaryHandle) -> bool {
        self.position(boundary).is_some()
    }

    pub fn get(&self, index: usize) -> Option<&BoundaryHandle> {
        self.boundaries.get(index)
    }

    pub fn as_slice(&self) -> &[BoundaryHandle] {
        &self.boundaries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BoundaryHandle> {
        self.boundaries.iter()
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::Boundary;
    use crate::shapes::Wall;

    fn wall(dist: f64) -> BoundaryHandle {
        Boundary::new(Arc::new(Wall::new([1.0, 0.0, 0.0], dist))).into_handle()
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut reg = BoundaryRegistry::new();
        let (a, b, c) = (wall(0.0), wall(1.0), wall(2.0));
        reg.add(a.clone());
        reg.add(b.clone());
        reg.add(c.clone());
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.position(&a), Some(0));
        assert_eq!(reg.position(&b), Some(1));
        assert_eq!(reg.position(&c), Some(2));
        assert_eq!(reg.generation(), 3);
    }

    #[test]
    fn test_remove_renumbers_following_boundaries() {
        let mut reg = BoundaryRegistry::new();
        let (a, b, c) = (wall(0.0), wall(1.0), wall(2.0));
        for h in [&a, &b, &c] {
            reg.add(h.clone());
        }
        assert!(reg.remove(&a));
        assert_eq!(reg.position(&b), Some(0));
        assert_eq!(reg.position(&c), Some(1));
        assert!(!reg.contains(&a));
        // caller's handle is still valid after removal
        assert_eq!(a.velocity(), [0.0; 3]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut reg = BoundaryRegistry::new();
        reg.add(wall(0.0));
        let generation = reg.generation();
        let stranger = wall(0.0);
        assert!(!reg.remove(&stranger));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.generation(), generation);
    }

    #[test]
    fn test_identity_not_equality() {
        let mut reg = BoundaryRegistry::new();
        let a = wall(0.0);
        let twin = wall(0.0);
        reg.add(a.clone());
        assert!(reg.contains(&a));
        assert!(!reg.contains(&twin));
    }

    #[test]
    fn test_remove_only_first_duplicate() {
        let mut reg = BoundaryRegistry::new();
        let a = wall(0.0);
        let b = wall(1.0);
        reg.add(a.clone());
        reg.add(b.clone());
        reg.add(a.clone());
        assert!(reg.remove(&a));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.position(&b), Some(0));
        assert_eq!(reg.position(&a), Some(1));
    }
}
