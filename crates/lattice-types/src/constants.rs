// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Boundary flag of a fluid node. Real boundaries are stored as index + 1.
pub const NO_BOUNDARY: u32 = 0;

/// Halo padding (nodes) on every face of a rank-local lattice.
pub const HALO_WIDTH: usize = 1;

/// Offset of a halo-extended node position relative to its local index.
/// Rank-local positions are `(offset + x - 0.5) * agrid`.
pub const HALO_POSITION_SHIFT: f64 = 0.5;

/// Offset of a cell-centred global node position: `(x + 0.5) * agrid`.
pub const CELL_CENTER_SHIFT: f64 = 0.5;

/// Components per velocity / force entry in flat per-boundary tables.
pub const VEC3_STRIDE: usize = 3;
