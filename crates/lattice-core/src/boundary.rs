// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Boundary
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Boundary entity: geometry, prescribed wall velocity, surface charge.
//!
//! Boundaries are shared between the registry and callers through
//! [`BoundaryHandle`]; identity is pointer identity of the handle.

use crate::shapes::{shape_from_config, Shape};
use lattice_types::config::BoundaryConfig;
use lattice_types::state::Vec3;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared ownership handle used by the registry and by callers.
pub type BoundaryHandle = Arc<Boundary>;

#[derive(Debug)]
pub struct Boundary {
    shape: Arc<dyn Shape>,
    velocity: Vec3,
    charge_density: f64,
    /// Recomputed from scratch on every classification pass.
    net_charge: Mutex<f64>,
}

impl Boundary {
    /// No-slip, uncharged boundary.
    pub fn new(shape: Arc<dyn Shape>) -> Self {
        Boundary {
            shape,
            velocity: [0.0; 3],
            charge_density: 0.0,
            net_charge: Mutex::new(0.0),
        }
    }

    pub fn from_config(cfg: &BoundaryConfig) -> Self {
        Boundary::new(shape_from_config(&cfg.shape))
            .with_velocity(cfg.velocity)
            .with_charge_density(cfg.charge_density)
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_charge_density(mut self, charge_density: f64) -> Self {
        self.charge_density = charge_density;
        self
    }

    /// Wrap into a shared handle.
    pub fn into_handle(self) -> BoundaryHandle {
        Arc::new(self)
    }

    pub fn shape(&self) -> &Arc<dyn Shape> {
        &self.shape
    }

    /// Prescribed wall velocity in physical units.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Zero velocity means a no-slip wall.
    pub fn is_moving(&self) -> bool {
        self.velocity.iter().any(|&v| v != 0.0)
    }

    pub fn charge_density(&self) -> f64 {
        self.charge_density
    }

    pub fn is_charged(&self) -> bool {
        self.charge_density != 0.0
    }

    /// Net wall charge accumulated during the last classification pass.
    pub fn net_charge(&self) -> f64 {
        *self.net_charge.lock()
    }

    pub(crate) fn reset_net_charge(&self) {
        *self.net_charge.lock() = 0.0;
    }

    pub(crate) fn add_net_charge(&self, q: f64) {
        *self.net_charge.lock() += q;
    }

    pub fn distance_to(&self, pos: &Vec3) -> (f64, Vec3) {
        self.shape.distance_to(pos)
    }
}
