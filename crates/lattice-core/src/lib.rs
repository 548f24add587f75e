// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Lattice Core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Boundary classification for lattice-Boltzmann fluid solvers.
//!
//! Registry and shapes, one node classifier shared by the partitioned
//! (halo-extended, per-rank) and global (accelerator) backends, wall-charge
//! coupling into electrokinetics, and per-boundary force lookup.

pub mod accelerator;
pub mod boundary;
pub mod classifier;
pub mod cpu;
pub mod domain;
pub mod electrokinetics;
pub mod force;
pub mod registry;
pub mod shapes;
pub mod system;
