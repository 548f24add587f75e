// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Process Domain Decomposition
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! 3D Cartesian process topology for the partitioned backend.
//!
//! Every rank owns an identical `local_grid` block, so the global origin of
//! a rank is `node_pos * local_grid`. Each block is padded by one halo node
//! on every face for the fluid solver's neighbour exchange.

use lattice_types::constants::HALO_WIDTH;
use lattice_types::error::{LatticeError, LatticeResult};
use lattice_types::state::Grid3D;

/// One rank of a (px × py × pz) process grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankTile {
    /// Linear rank index, x-fastest over the process grid.
    pub rank: usize,
    /// Position of this rank in the process grid.
    pub node_pos: [usize; 3],
    /// Process grid dimensions.
    pub node_grid: [usize; 3],
    /// Owned nodes per axis (excluding halo).
    pub local_grid: [usize; 3],
}

impl RankTile {
    /// Global index of the first owned node on each axis.
    pub fn offset(&self) -> [usize; 3] {
        [
            self.node_pos[0] * self.local_grid[0],
            self.node_pos[1] * self.local_grid[1],
            self.node_pos[2] * self.local_grid[2],
        ]
    }

    /// Halo-extended local extent.
    pub fn halo_grid(&self) -> [usize; 3] {
        [
            self.local_grid[0] + 2 * HALO_WIDTH,
            self.local_grid[1] + 2 * HALO_WIDTH,
            self.local_grid[2] + 2 * HALO_WIDTH,
        ]
    }

    pub fn local_volume(&self) -> usize {
        self.local_grid.iter().product()
    }

    pub fn halo_volume(&self) -> usize {
        self.halo_grid().iter().product()
    }

    /// Whether halo-local index `(x, y, z)` is an owned (non-halo) node.
    pub fn is_owned(&self, x: usize, y: usize, z: usize) -> bool {
        [x, y, z]
            .iter()
            .zip(self.local_grid.iter())
            .all(|(&i, &n)| i >= HALO_WIDTH && i < n + HALO_WIDTH)
    }

    /// Global coordinates of the owned halo-local node `(x, y, z)`.
    pub fn to_global(&self, x: usize, y: usize, z: usize) -> [usize; 3] {
        let o = self.offset();
        [
            o[0] + x - HALO_WIDTH,
            o[1] + y - HALO_WIDTH,
            o[2] + z - HALO_WIDTH,
        ]
    }
}

fn rank_of(pos: [usize; 3], node_grid: [usize; 3]) -> usize {
    pos[0] + node_grid[0] * (pos[1] + node_grid[1] * pos[2])
}

/// Decompose `global` into a Cartesian `node_grid` of equal blocks.
///
/// Returns tiles ordered by rank.
pub fn decompose_3d(global: &Grid3D, node_grid: [usize; 3]) -> LatticeResult<Vec<RankTile>> {
    if node_grid.iter().any(|&n| n == 0) {
        return Err(LatticeError::Decomposition(format!(
            "Process grid entries must be >= 1, got {node_grid:?}"
        )));
    }
    let mut local_grid = [0usize; 3];
    for axis in 0..3 {
        if global.dims[axis] % node_grid[axis] != 0 {
            return Err(LatticeError::Decomposition(format!(
                "Cannot split {} nodes on axis {axis} evenly across {} ranks",
                global.dims[axis], node_grid[axis]
            )));
        }
        local_grid[axis] = global.dims[axis] / node_grid[axis];
    }

    let n_ranks: usize = node_grid.iter().product();
    let mut tiles = Vec::with_capacity(n_ranks);
    for pz in 0..node_grid[2] {
        for py in 0..node_grid[1] {
            for px in 0..node_grid[0] {
                let node_pos = [px, py, pz];
                tiles.push(RankTile {
                    rank: rank_of(node_pos, node_grid),
                    node_pos,
                    node_grid,
                    local_grid,
                });
            }
        }
    }
    Ok(tiles)
}
