// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Global (Accelerator) Backend
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Global-grid backend for a device-resident fluid solver.
//!
//! The coordinating rank classifies the whole cell-centred grid (no halo)
//! and uploads three tables: boundary node indices, their 1-based owners,
//! and a flat velocity table terminated by a zero "no boundary" entry.

use crate::boundary::BoundaryHandle;
use crate::classifier::{sweep, ClassificationSink, GridSource, NodeCoord};
use lattice_types::constants::VEC3_STRIDE;
use lattice_types::error::{LatticeError, LatticeResult};
use lattice_types::state::{Grid3D, Vec3};
use parking_lot::Mutex;
use std::sync::Arc;

/// Rank that performs the global sweep and device upload.
pub const COORDINATOR_RANK: usize = 0;

impl GridSource for Grid3D {
    fn dims(&self) -> [usize; 3] {
        self.dims
    }

    fn position(&self, x: usize, y: usize, z: usize) -> Vec3 {
        self.cell_center(x, y, z)
    }
}

/// Host-side transfer artefacts of one global sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryTables {
    /// Linear indices of boundary nodes, in sweep order.
    pub node_list: Vec<u32>,
    /// Owner of each listed node, 1-based.
    pub index_list: Vec<u32>,
    /// `3 * (n_boundaries + 1)` velocities; the last triplet is zero.
    pub velocity: Vec<f32>,
}

impl BoundaryTables {
    pub fn number_of_boundnodes(&self) -> usize {
        self.node_list.len()
    }

    pub fn number_of_boundaries(&self) -> usize {
        (self.velocity.len() / VEC3_STRIDE).saturating_sub(1)
    }

    /// `(linear node index, 0-based boundary index)` pairs.
    pub fn boundary_nodes(&self) -> Vec<(usize, usize)> {
        self.node_list
            .iter()
            .zip(self.index_list.iter())
            .map(|(&n, &b)| (n as usize, (b - 1) as usize))
            .collect()
    }
}

#[derive(Default)]
struct TableSink {
    node_list: Vec<u32>,
    index_list: Vec<u32>,
}

impl ClassificationSink for TableSink {
    fn record(&mut self, node: NodeCoord, owner: Option<usize>, _boundaries: &[BoundaryHandle]) {
        if let Some(i) = owner {
            self.node_list.push(node.linear as u32);
            self.index_list.push(i as u32 + 1);
        }
    }
}

/// Classify the full cell-centred grid and build the device tables.
pub fn build_boundary_tables(
    grid: &Grid3D,
    boundaries: &[BoundaryHandle],
) -> LatticeResult<BoundaryTables> {
    if grid.volume() > u32::MAX as usize {
        return Err(LatticeError::Device(format!(
            "Grid of {} nodes exceeds 32-bit device indexing",
            grid.volume()
        )));
    }
    let mut sink = TableSink::default();
    sweep(grid, boundaries, &mut sink);

    let n = boundaries.len();
    let mut velocity = vec![0.0f32; VEC3_STRIDE * (n + 1)];
    for (i, b) in boundaries.iter().enumerate() {
        let v = b.velocity();
        for axis in 0..3 {
            velocity[VEC3_STRIDE * i + axis] = v[axis] as f32;
        }
    }

    Ok(BoundaryTables {
        node_list: sink.node_list,
        index_list: sink.index_list,
        velocity,
    })
}

/// Device-resident boundary state of an accelerator fluid solver.
pub trait DeviceBoundaryState: Send {
    fn name(&self) -> &str;

    /// Replace the device boundary tables; resets per-boundary forces.
    fn upload_boundaries(&mut self, tables: &BoundaryTables) -> LatticeResult<()>;

    /// Dense per-node boundary flags (0 = fluid), x-fastest.
    fn boundary_flags(&self) -> LatticeResult<Vec<u32>>;

    /// Per-boundary force accumulated by the device solver, `3 * n` values.
    fn read_boundary_forces(&self, n_boundaries: usize) -> LatticeResult<Vec<f64>>;
}

/// Host-memory stand-in for a device solver, used where no accelerator is
/// present. The force buffer is shared with whoever accumulates forces.
#[derive(Debug)]
pub struct HostDevice {
    volume: usize,
    tables: BoundaryTables,
    flags: Vec<u32>,
    forces: Arc<Mutex<Vec<f64>>>,
}

impl HostDevice {
    pub fn new(grid: &Grid3D) -> Self {
        HostDevice {
            volume: grid.volume(),
            tables: BoundaryTables::default(),
            flags: vec![0; grid.volume()],
            forces: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn tables(&self) -> &BoundaryTables {
        &self.tables
    }

    /// Shared per-boundary force buffer, flat `3 * n`.
    pub fn force_buffer(&self) -> Arc<Mutex<Vec<f64>>> {
        Arc::clone(&self.forces)
    }
}

impl DeviceBoundaryState for HostDevice {
    fn name(&self) -> &str {
        "host"
    }

    fn upload_boundaries(&mut self, tables: &BoundaryTables) -> LatticeResult<()> {
        self.flags.iter_mut().for_each(|f| *f = 0);
        for (&node, &owner) in tables.node_list.iter().zip(tables.index_list.iter()) {
            let slot = self.flags.get_mut(node as usize).ok_or_else(|| {
                LatticeError::Device(format!(
                    "Boundary node {node} outside device grid of {} nodes",
                    self.volume
                ))
            })?;
            *slot = owner;
        }
        *self.forces.lock() = vec![0.0; VEC3_STRIDE * tables.number_of_boundaries()];
        self.tables = tables.clone();
        Ok(())
    }

    fn boundary_flags(&self) -> LatticeResult<Vec<u32>> {
        Ok(self.flags.clone())
    }

    fn read_boundary_forces(&self, n_boundaries: usize) -> LatticeResult<Vec<f64>> {
        let forces = self.forces.lock();
        if forces.len() != VEC3_STRIDE * n_boundaries {
            return Err(LatticeError::Device(format!(
                "Device force buffer holds {} values, expected {}",
                forces.len(),
                VEC3_STRIDE * n_boundaries
            )));
        }
        Ok(forces.clone())
    }
}

/// Accelerator backend as seen from one rank.
pub struct GpuBackend {
    this_node: usize,
    grid: Grid3D,
    device: Box<dyn DeviceBoundaryState>,
    tables: BoundaryTables,
}

impl GpuBackend {
    pub fn new(this_node: usize, grid: Grid3D, device: Box<dyn DeviceBoundaryState>) -> Self {
        GpuBackend {
            this_node,
            grid,
            device,
            tables: BoundaryTables::default(),
        }
    }

    pub fn is_coordinator(&self) -> bool {
        self.this_node == COORDINATOR_RANK
    }

    pub fn grid(&self) -> &Grid3D {
        &self.grid
    }

    pub fn device(&self) -> &dyn DeviceBoundaryState {
        self.device.as_ref()
    }

    /// Tables of the last sweep (empty on non-coordinating ranks).
    pub fn tables(&self) -> &BoundaryTables {
        &self.tables
    }

    /// Sweep the global grid and upload. Returns false on ranks other than
    /// the coordinator, which do nothing.
    pub fn reclassify(&mut self, boundaries: &[BoundaryHandle]) -> LatticeResult<bool> {
        if !self.is_coordinator() {
            return Ok(false);
        }
        self.tables = build_boundary_tables(&self.grid, boundaries)?;
        self.device.upload_boundaries(&self.tables)?;
        log::debug!(
            "uploaded {} boundary nodes for {} boundaries to device '{}'",
            self.tables.number_of_boundnodes(),
            boundaries.len(),
            self.device.name()
        );
        Ok(true)
    }

    /// Device read-back on the coordinator; zeros elsewhere.
    pub fn read_boundary_forces(&self, n_boundaries: usize) -> LatticeResult<Vec<f64>> {
        if !self.is_coordinator() {
            return Ok(vec![0.0; VEC3_STRIDE * n_boundaries]);
        }
        self.device.read_boundary_forces(n_boundaries)
    }
}

impl std::fmt::Debug for GpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuBackend")
            .field("this_node", &self.this_node)
            .field("grid", &self.grid)
            .field("device", &self.device.name())
            .field("boundary_nodes", &self.tables.number_of_boundnodes())
            .finish()
    }
}
