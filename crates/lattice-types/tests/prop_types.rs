// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Property-Based Tests (proptest) for lattice-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for lattice-types using proptest.
//!
//! Covers: Grid3D indexing invariants, cell-centre positions,
//! field allocation shapes.

use lattice_types::state::{Grid3D, LbNode};
use proptest::prelude::*;

// ── Grid3D Indexing Invariants ───────────────────────────────────────

proptest! {
    /// unravel(linear_index(x, y, z)) == (x, y, z) for every node.
    #[test]
    fn linear_index_roundtrip(
        nx in 1usize..12,
        ny in 1usize..12,
        nz in 1usize..12,
    ) {
        let grid = Grid3D::new([nx, ny, nz], 1.0);
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    let i = grid.linear_index(x, y, z);
                    prop_assert!(i < grid.volume());
                    prop_assert_eq!(grid.unravel(i), [x, y, z]);
                }
            }
        }
    }

    /// Sweep order (z outer, then y, then x) visits linear indices 0..volume in order.
    #[test]
    fn sweep_order_is_monotone(
        nx in 1usize..10,
        ny in 1usize..10,
        nz in 1usize..10,
    ) {
        let grid = Grid3D::new([nx, ny, nz], 1.0);
        let mut expected = 0usize;
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    prop_assert_eq!(grid.linear_index(x, y, z), expected);
                    expected += 1;
                }
            }
        }
        prop_assert_eq!(expected, grid.volume());
    }

    /// Cell centres lie strictly inside their cell.
    #[test]
    fn cell_center_inside_cell(
        x in 0usize..50,
        y in 0usize..50,
        z in 0usize..50,
        agrid in 0.01f64..10.0,
    ) {
        let grid = Grid3D::new([50, 50, 50], agrid);
        let c = grid.cell_center(x, y, z);
        for (axis, idx) in [x, y, z].iter().enumerate() {
            let lo = *idx as f64 * agrid;
            prop_assert!(c[axis] > lo && c[axis] < lo + agrid);
        }
    }

    /// Field shape is [nz, ny, nx] and starts as fluid.
    #[test]
    fn field_shape_matches_dims(
        nx in 1usize..16,
        ny in 1usize..16,
        nz in 1usize..16,
    ) {
        let grid = Grid3D::new([nx, ny, nz], 1.0);
        let field = grid.field(LbNode::default());
        prop_assert_eq!(field.shape(), &[nz, ny, nx]);
        prop_assert!(field.iter().all(|n| !n.is_boundary()));
    }
}
