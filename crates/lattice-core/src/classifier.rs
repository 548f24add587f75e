// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Node Classifier
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Backend-agnostic node classification.
//!
//! A sweep walks a [`GridSource`] (node positions) and hands the owner of
//! every node to a [`ClassificationSink`]. Both backends share this code;
//! they differ only in the source (halo-extended local grid vs. global
//! cell-centred grid) and in the sink (field storage vs. compacted tables).
//!
//! Nearest-boundary rule: the first boundary establishes the baseline, later
//! boundaries replace it only on a strictly smaller distance. Equal distances
//! therefore resolve to the earliest-added boundary on every backend.

use crate::boundary::BoundaryHandle;
use lattice_types::state::Vec3;
use rayon::prelude::*;

/// Closest boundary to a node, regardless of sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestBoundary {
    /// 0-based registry index.
    pub index: usize,
    pub distance: f64,
}

/// Scan all boundaries for the one nearest to `pos`.
/// Returns `None` only when `boundaries` is empty.
pub fn nearest_boundary(boundaries: &[BoundaryHandle], pos: &Vec3) -> Option<NearestBoundary> {
    let mut best: Option<NearestBoundary> = None;
    for (index, boundary) in boundaries.iter().enumerate() {
        let (distance, _) = boundary.distance_to(pos);
        let improves = match best {
            None => true,
            Some(current) => distance < current.distance,
        };
        if improves {
            best = Some(NearestBoundary { index, distance });
        }
    }
    best
}

/// 0-based index of the boundary owning `pos`, or `None` for fluid.
pub fn owning_boundary(boundaries: &[BoundaryHandle], pos: &Vec3) -> Option<usize> {
    nearest_boundary(boundaries, pos)
        .filter(|nearest| nearest.distance <= 0.0)
        .map(|nearest| nearest.index)
}

/// Node positions of a 3D grid, visited z-major, then y, then x.
pub trait GridSource: Sync {
    /// Node count per axis `[nx, ny, nz]`.
    fn dims(&self) -> [usize; 3];

    /// Physical position of node `(x, y, z)`.
    fn position(&self, x: usize, y: usize, z: usize) -> Vec3;

    fn volume(&self) -> usize {
        let [nx, ny, nz] = self.dims();
        nx * ny * nz
    }
}

/// Grid coordinates of a node plus its x-fastest linear index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeCoord {
    pub x: usize,
    pub y: usize,
    pub z: usize,
    pub linear: usize,
}

/// Receives one classification per node, in sweep order.
pub trait ClassificationSink {
    fn record(&mut self, node: NodeCoord, owner: Option<usize>, boundaries: &[BoundaryHandle]);
}

/// Owner of every node of `source`, indexed by linear node index.
///
/// Distance queries run in parallel; the result order is the sweep order.
pub fn classify_grid<S>(source: &S, boundaries: &[BoundaryHandle]) -> Vec<Option<usize>>
where
    S: GridSource + ?Sized,
{
    let [nx, ny, _] = source.dims();
    (0..source.volume())
        .into_par_iter()
        .map(|i| {
            let x = i % nx;
            let y = (i / nx) % ny;
            let z = i / (nx * ny);
            owning_boundary(boundaries, &source.position(x, y, z))
        })
        .collect()
}

/// Classify every node of `source` and feed the result to `sink`.
/// Returns the number of boundary-owned nodes.
pub fn sweep<S, K>(source: &S, boundaries: &[BoundaryHandle], sink: &mut K) -> usize
where
    S: GridSource + ?Sized,
    K: ClassificationSink + ?Sized,
{
    let [nx, ny, _] = source.dims();
    let owners = classify_grid(source, boundaries);
    let mut boundary_nodes = 0usize;
    for (linear, owner) in owners.into_iter().enumerate() {
        let node = NodeCoord {
            x: linear % nx,
            y: (linear / nx) % ny,
            z: linear / (nx * ny),
            linear,
        };
        if owner.is_some() {
            boundary_nodes += 1;
        }
        sink.record(node, owner, boundaries);
    }
    boundary_nodes
}
