// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{CELL_CENTER_SHIFT, NO_BOUNDARY};
use ndarray::Array3;

/// Cartesian 3-vector (position, velocity, force).
pub type Vec3 = [f64; 3];

/// Regular 3D lattice with spacing `agrid`.
/// Linear node index is x-fastest: `x + nx * (y + ny * z)`,
/// which is also the memory order of an `Array3` shaped `[nz, ny, nx]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid3D {
    pub dims: [usize; 3],
    pub agrid: f64,
}

impl Grid3D {
    pub fn new(dims: [usize; 3], agrid: f64) -> Self {
        Grid3D { dims, agrid }
    }

    /// Total number of nodes.
    pub fn volume(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    /// Volume of a single lattice cell, `agrid³`.
    pub fn cell_volume(&self) -> f64 {
        self.agrid * self.agrid * self.agrid
    }

    pub fn linear_index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.dims[0] * (y + self.dims[1] * z)
    }

    /// Inverse of [`Grid3D::linear_index`], returns `[x, y, z]`.
    pub fn unravel(&self, index: usize) -> [usize; 3] {
        let nx = self.dims[0];
        let ny = self.dims[1];
        [index % nx, (index / nx) % ny, index / (nx * ny)]
    }

    /// Physical position of a cell-centred node.
    pub fn cell_center(&self, x: usize, y: usize, z: usize) -> Vec3 {
        [
            self.agrid * (x as f64 + CELL_CENTER_SHIFT),
            self.agrid * (y as f64 + CELL_CENTER_SHIFT),
            self.agrid * (z as f64 + CELL_CENTER_SHIFT),
        ]
    }

    /// Allocate a node field shaped `[nz, ny, nx]`.
    pub fn field<T: Clone>(&self, init: T) -> Array3<T> {
        Array3::from_elem((self.dims[2], self.dims[1], self.dims[0]), init)
    }
}

/// Per-node boundary state consumed by the fluid solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LbNode {
    /// 0 = fluid, otherwise boundary index + 1.
    pub boundary: u32,
    /// Wall velocity in lattice units (`v * tau / agrid`).
    pub slip_velocity: Vec3,
}

impl LbNode {
    pub fn is_boundary(&self) -> bool {
        self.boundary != NO_BOUNDARY
    }
}

impl Default for LbNode {
    fn default() -> Self {
        LbNode {
            boundary: NO_BOUNDARY,
            slip_velocity: [0.0; 3],
        }
    }
}

/// Summary of one classification pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationReport {
    pub n_boundaries: usize,
    /// Boundary nodes found (owned nodes only on the partitioned backend).
    pub boundary_nodes: usize,
    /// Fluid nodes among the nodes counted above.
    pub fluid_nodes: usize,
    pub elapsed_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_index_is_x_fastest() {
        let grid = Grid3D::new([4, 3, 2], 1.0);
        assert_eq!(grid.linear_index(0, 0, 0), 0);
        assert_eq!(grid.linear_index(1, 0, 0), 1);
        assert_eq!(grid.linear_index(0, 1, 0), 4);
        assert_eq!(grid.linear_index(0, 0, 1), 12);
        assert_eq!(grid.linear_index(3, 2, 1), 23);
        assert_eq!(grid.volume(), 24);
    }

    #[test]
    fn test_unravel_inverts_linear_index() {
        let grid = Grid3D::new([5, 4, 3], 0.5);
        for i in 0..grid.volume() {
            let [x, y, z] = grid.unravel(i);
            assert_eq!(grid.linear_index(x, y, z), i);
        }
    }

    #[test]
    fn test_field_memory_order_matches_linear_index() {
        let grid = Grid3D::new([3, 2, 2], 1.0);
        let mut field = grid.field(0usize);
        for ((z, y, x), v) in field.indexed_iter_mut() {
            *v = grid.linear_index(x, y, z);
        }
        let flat = field.as_slice().expect("standard layout");
        for (i, v) in flat.iter().enumerate() {
            assert_eq!(*v, i);
        }
    }

    #[test]
    fn test_cell_center_and_volume() {
        let grid = Grid3D::new([4, 4, 4], 2.0);
        assert_eq!(grid.cell_center(0, 1, 3), [1.0, 3.0, 7.0]);
        assert!((grid.cell_volume() - 8.0).abs() < 1e-15);
    }

    #[test]
    fn test_default_node_is_fluid() {
        let node = LbNode::default();
        assert!(!node.is_boundary());
        assert_eq!(node.slip_velocity, [0.0; 3]);
    }
}
