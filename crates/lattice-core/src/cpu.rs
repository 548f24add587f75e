// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Partitioned (CPU) Backend
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Partitioned backend: every rank classifies its own halo-extended block.
//!
//! Ranks never communicate during a sweep. The in-process backend runs one
//! sweep per rank on the Rayon pool, the same way a distributed run would
//! run one sweep per process.

use crate::boundary::BoundaryHandle;
use crate::classifier::{sweep, ClassificationSink, GridSource, NodeCoord};
use crate::domain::{decompose_3d, RankTile};
use lattice_types::constants::{HALO_POSITION_SHIFT, NO_BOUNDARY, VEC3_STRIDE};
use lattice_types::error::{LatticeError, LatticeResult};
use lattice_types::state::{Grid3D, LbNode, Vec3};
use ndarray::Array3;
use rayon::prelude::*;

/// Rank-local fluid storage: halo-extended node fields plus the
/// momentum-exchange force the fluid solver deposits on each boundary.
#[derive(Debug, Clone)]
pub struct LocalLattice {
    tile: RankTile,
    agrid: f64,
    /// Shaped `[nz + 2, ny + 2, nx + 2]`.
    fields: Array3<LbNode>,
    boundary_forces: Vec<Vec3>,
}

impl LocalLattice {
    pub fn new(tile: RankTile, agrid: f64) -> Self {
        let [hx, hy, hz] = tile.halo_grid();
        let fields = if tile.local_volume() == 0 {
            Array3::from_elem((0, 0, 0), LbNode::default())
        } else {
            Array3::from_elem((hz, hy, hx), LbNode::default())
        };
        LocalLattice {
            tile,
            agrid,
            fields,
            boundary_forces: Vec::new(),
        }
    }

    pub fn tile(&self) -> &RankTile {
        &self.tile
    }

    pub fn fields(&self) -> &Array3<LbNode> {
        &self.fields
    }

    /// Node at halo-local coordinates.
    pub fn node(&self, x: usize, y: usize, z: usize) -> Option<&LbNode> {
        self.fields.get([z, y, x])
    }

    /// Deposit the force exerted by the fluid on boundary `flag`
    /// (the 1-based value stored in [`LbNode::boundary`]).
    pub fn add_boundary_force(&mut self, flag: u32, force: Vec3) -> LatticeResult<()> {
        let n = self.boundary_forces.len();
        let slot = (flag as usize)
            .checked_sub(1)
            .and_then(|i| self.boundary_forces.get_mut(i))
            .ok_or_else(|| {
                LatticeError::ConfigError(format!("Boundary flag {flag} out of range 1..={n}"))
            })?;
        for axis in 0..3 {
            slot[axis] += force[axis];
        }
        Ok(())
    }

    pub fn boundary_forces(&self) -> &[Vec3] {
        &self.boundary_forces
    }

    /// Owned (non-halo) boundary nodes as `(global linear index, boundary index)`,
    /// in sweep order.
    pub fn owned_boundary_nodes(&self, global: &Grid3D) -> Vec<(usize, usize)> {
        self.fields
            .indexed_iter()
            .filter(|((z, y, x), node)| node.is_boundary() && self.tile.is_owned(*x, *y, *z))
            .map(|((z, y, x), node)| {
                let [gx, gy, gz] = self.tile.to_global(x, y, z);
                (
                    global.linear_index(gx, gy, gz),
                    (node.boundary - 1) as usize,
                )
            })
            .collect()
    }

    fn reset(&mut self, n_boundaries: usize) {
        self.fields.fill(LbNode::default());
        self.boundary_forces = vec![[0.0; 3]; n_boundaries];
    }
}

/// Halo-extended node positions `(offset + x - 0.5) * agrid`.
struct HaloSource {
    offset: [usize; 3],
    dims: [usize; 3],
    agrid: f64,
}

impl GridSource for HaloSource {
    fn dims(&self) -> [usize; 3] {
        self.dims
    }

    fn position(&self, x: usize, y: usize, z: usize) -> Vec3 {
        let o = self.offset;
        [
            (o[0] as f64 + x as f64 - HALO_POSITION_SHIFT) * self.agrid,
            (o[1] as f64 + y as f64 - HALO_POSITION_SHIFT) * self.agrid,
            (o[2] as f64 + z as f64 - HALO_POSITION_SHIFT) * self.agrid,
        ]
    }
}

struct FieldSink<'a> {
    fields: &'a mut Array3<LbNode>,
    /// tau / agrid: physical to lattice velocity units.
    velocity_scale: f64,
}

impl ClassificationSink for FieldSink<'_> {
    fn record(&mut self, node: NodeCoord, owner: Option<usize>, boundaries: &[BoundaryHandle]) {
        let field = &mut self.fields[[node.z, node.y, node.x]];
        match owner {
            Some(i) => {
                let v = boundaries[i].velocity();
                field.boundary = (i + 1) as u32;
                field.slip_velocity = [
                    v[0] * self.velocity_scale,
                    v[1] * self.velocity_scale,
                    v[2] * self.velocity_scale,
                ];
            }
            None => {
                field.boundary = NO_BOUNDARY;
                field.slip_velocity = [0.0; 3];
            }
        }
    }
}

/// Classify one rank's halo-extended block. Returns the number of boundary
/// nodes including halo nodes. A zero-volume block is left untouched.
pub fn init_local_boundaries(
    lattice: &mut LocalLattice,
    boundaries: &[BoundaryHandle],
    tau: f64,
) -> usize {
    if lattice.tile.local_volume() == 0 {
        return 0;
    }
    lattice.reset(boundaries.len());

    let source = HaloSource {
        offset: lattice.tile.offset(),
        dims: lattice.tile.halo_grid(),
        agrid: lattice.agrid,
    };
    let mut sink = FieldSink {
        fields: &mut lattice.fields,
        velocity_scale: tau / lattice.agrid,
    };
    let n = sweep(&source, boundaries, &mut sink);
    log::trace!(
        "rank {}: {} boundary nodes in halo-extended block {:?}",
        lattice.tile.rank,
        n,
        lattice.tile.halo_grid()
    );
    n
}

/// All ranks of a partitioned lattice, held in one process.
#[derive(Debug, Clone)]
pub struct CpuBackend {
    global: Grid3D,
    tau: f64,
    locals: Vec<LocalLattice>,
}

impl CpuBackend {
    pub fn new(global: Grid3D, tau: f64, node_grid: [usize; 3]) -> LatticeResult<Self> {
        let tiles = decompose_3d(&global, node_grid)?;
        let locals = tiles
            .into_iter()
            .map(|t| LocalLattice::new(t, global.agrid))
            .collect();
        Ok(CpuBackend {
            global,
            tau,
            locals,
        })
    }

    pub fn global(&self) -> &Grid3D {
        &self.global
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    pub fn locals(&self) -> &[LocalLattice] {
        &self.locals
    }

    pub fn locals_mut(&mut self) -> &mut [LocalLattice] {
        &mut self.locals
    }

    /// Re-run every rank's local sweep. Returns the number of owned
    /// boundary nodes summed over ranks.
    pub fn reclassify(&mut self, boundaries: &[BoundaryHandle]) -> usize {
        let tau = self.tau;
        self.locals
            .par_iter_mut()
            .for_each(|local| {
                init_local_boundaries(local, boundaries, tau);
            });
        self.locals
            .iter()
            .map(|l| {
                l.fields
                    .indexed_iter()
                    .filter(|((z, y, x), n)| n.is_boundary() && l.tile.is_owned(*x, *y, *z))
                    .count()
            })
            .sum()
    }

    /// Owned boundary nodes of all ranks, rank by rank.
    pub fn owned_boundary_nodes(&self) -> Vec<(usize, usize)> {
        self.locals
            .iter()
            .flat_map(|l| l.owned_boundary_nodes(&self.global))
            .collect()
    }

    /// Global statistics reduction: per-boundary force summed over ranks,
    /// flattened as `[fx0, fy0, fz0, fx1, ...]`.
    pub fn gather_boundary_forces(&self, n_boundaries: usize) -> Vec<f64> {
        let mut forces = vec![0.0; VEC3_STRIDE * n_boundaries];
        for local in &self.locals {
            for (i, f) in local.boundary_forces.iter().take(n_boundaries).enumerate() {
                for axis in 0..3 {
                    forces[VEC3_STRIDE * i + axis] += f[axis];
                }
            }
        }
        forces
    }

    /// Stitch owned boundary flags of all ranks into one global array
    /// shaped `[nz, ny, nx]`.
    pub fn global_flags(&self) -> Array3<u32> {
        let mut flags = self.global.field(NO_BOUNDARY);
        for local in &self.locals {
            for ((z, y, x), node) in local.fields.indexed_iter() {
                if local.tile.is_owned(x, y, z) {
                    let [gx, gy, gz] = local.tile.to_global(x, y, z);
                    flags[[gz, gy, gx]] = node.boundary;
                }
            }
        }
        flags
    }
}
