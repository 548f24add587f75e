// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Electrokinetic Wall Charge
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Coupling of boundary surface charge into the electrokinetic solver.
//!
//! Every boundary node owned by a charged boundary carries
//! `charge_density * agrid³`. That charge is added to the owner's net charge
//! and, divided by the valency of the carrier species, written into the
//! per-node wall-charge buffer the electrokinetic solver initialises from.

use crate::boundary::BoundaryHandle;
use lattice_types::config::ElectrokineticConfig;
use lattice_types::error::{LatticeError, LatticeResult};
use lattice_types::state::Grid3D;

/// Electrokinetic solver state touched by the boundary pass.
#[derive(Debug, Clone)]
pub struct ElectrokineticState {
    active: bool,
    agrid: f64,
    dims: [usize; 3],
    valencies: Vec<f64>,
    number_of_boundary_nodes: usize,
    wallcharge_species: Option<usize>,
    /// One entry per node, x-fastest linear order.
    wallcharge_density: Vec<f64>,
}

impl ElectrokineticState {
    pub fn new(dims: [usize; 3], agrid: f64, valencies: Vec<f64>) -> Self {
        let n: usize = dims.iter().product();
        ElectrokineticState {
            active: true,
            agrid,
            dims,
            valencies,
            number_of_boundary_nodes: 0,
            wallcharge_species: None,
            wallcharge_density: vec![0.0; n],
        }
    }

    /// Electrokinetics on the same node layout as the fluid lattice.
    pub fn from_config(cfg: &ElectrokineticConfig, grid: &Grid3D) -> Self {
        Self::new(grid.dims, cfg.agrid, cfg.valencies.clone())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn agrid(&self) -> f64 {
        self.agrid
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn number_of_nodes(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn valencies(&self) -> &[f64] {
        &self.valencies
    }

    pub fn number_of_boundary_nodes(&self) -> usize {
        self.number_of_boundary_nodes
    }

    /// Species carrying the wall charge in the last pass.
    pub fn wallcharge_species(&self) -> Option<usize> {
        self.wallcharge_species
    }

    pub fn wallcharge_density(&self) -> &[f64] {
        &self.wallcharge_density
    }
}

/// First species with a non-zero valency.
pub fn wallcharge_species(valencies: &[f64]) -> Option<usize> {
    valencies.iter().position(|&z| z != 0.0)
}

/// Zero the net charge of every boundary.
pub fn reset_net_charges(boundaries: &[BoundaryHandle]) {
    for b in boundaries {
        b.reset_net_charge();
    }
}

/// Per-pass wall-charge plan, fixed before the sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallChargeCoupling {
    charged: bool,
    species: Option<usize>,
    cell_volume: f64,
}

impl WallChargeCoupling {
    /// Inspect boundaries and species before a pass.
    ///
    /// Fails only when the electrokinetic lattice does not match the fluid
    /// lattice; a missing carrier species is reported via
    /// [`WallChargeCoupling::missing_species`] so the pass can continue.
    pub fn prepare(
        boundaries: &[BoundaryHandle],
        ek: &ElectrokineticState,
        lb_grid: &Grid3D,
    ) -> LatticeResult<Self> {
        if ek.dims != lb_grid.dims {
            return Err(LatticeError::ConfigError(format!(
                "Electrokinetic lattice {:?} does not match fluid lattice {:?}",
                ek.dims, lb_grid.dims
            )));
        }
        Ok(WallChargeCoupling {
            charged: boundaries.iter().any(|b| b.is_charged()),
            species: wallcharge_species(&ek.valencies),
            cell_volume: ek.agrid * ek.agrid * ek.agrid,
        })
    }

    /// Charged boundaries present but no species can carry the charge.
    pub fn missing_species(&self) -> bool {
        self.charged && self.species.is_none()
    }

    pub fn species(&self) -> Option<usize> {
        self.species
    }

    /// Rebuild the wall-charge buffer and net charges from the boundary nodes
    /// `(global linear index, boundary index)` of a finished sweep.
    pub fn deposit(
        &self,
        boundaries: &[BoundaryHandle],
        boundary_nodes: &[(usize, usize)],
        ek: &mut ElectrokineticState,
    ) {
        ek.wallcharge_density.iter_mut().for_each(|v| *v = 0.0);
        ek.wallcharge_species = self.species;
        ek.number_of_boundary_nodes = boundary_nodes.len();
        if !self.charged {
            return;
        }
        let valency = self.species.map(|s| ek.valencies[s]);
        for &(node, owner) in boundary_nodes {
            let Some(boundary) = boundaries.get(owner) else {
                continue;
            };
            if !boundary.is_charged() {
                continue;
            }
            let q = boundary.charge_density() * self.cell_volume;
            boundary.add_net_charge(q);
            if let (Some(z), Some(slot)) = (valency, ek.wallcharge_density.get_mut(node)) {
                *slot = q / z;
            }
        }
    }
}
