// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Boundary Force Accounting
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Hydrodynamic force exerted by the fluid on a registered boundary.

use crate::accelerator::GpuBackend;
use crate::boundary::BoundaryHandle;
use crate::cpu::CpuBackend;
use crate::registry::BoundaryRegistry;
use lattice_types::constants::VEC3_STRIDE;
use lattice_types::error::{LatticeError, LatticeResult};
use lattice_types::state::Vec3;

/// Backend currently holding the classified lattice.
#[derive(Debug)]
pub enum ActiveBackend {
    Cpu(CpuBackend),
    Gpu(GpuBackend),
}

impl ActiveBackend {
    /// Flat `[fx0, fy0, fz0, fx1, ...]` force array for `n_boundaries`.
    pub fn boundary_forces(&self, n_boundaries: usize) -> LatticeResult<Vec<f64>> {
        match self {
            ActiveBackend::Cpu(cpu) => Ok(cpu.gather_boundary_forces(n_boundaries)),
            ActiveBackend::Gpu(gpu) => gpu.read_boundary_forces(n_boundaries),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActiveBackend::Cpu(_) => "cpu",
            ActiveBackend::Gpu(_) => "gpu",
        }
    }
}

/// 3-vector at slot `index` of a flat force array.
pub fn force_slot(forces: &[f64], index: usize) -> LatticeResult<Vec3> {
    let start = VEC3_STRIDE * index;
    match forces.get(start..start + VEC3_STRIDE) {
        Some(f) => Ok([f[0], f[1], f[2]]),
        None => Err(LatticeError::Device(format!(
            "Force array of {} values has no slot {index}",
            forces.len()
        ))),
    }
}

/// Force on `boundary`.
///
/// Fails with [`LatticeError::UnregisteredBoundary`] if the handle is not in
/// `registry`. Without an active backend the force is zero.
pub fn boundary_force(
    registry: &BoundaryRegistry,
    backend: Option<&ActiveBackend>,
    boundary: &BoundaryHandle,
) -> LatticeResult<Vec3> {
    let index = registry
        .position(boundary)
        .ok_or(LatticeError::UnregisteredBoundary)?;
    let Some(backend) = backend else {
        return Ok([0.0; 3]);
    };
    let forces = backend.boundary_forces(registry.len())?;
    force_slot(&forces, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accelerator::HostDevice;
    use crate::boundary::Boundary;
    use crate::shapes::Wall;
    use lattice_types::state::Grid3D;
    use std::sync::Arc;

    fn wall() -> BoundaryHandle {
        Boundary::new(Arc::new(Wall::new([1.0, 0.0, 0.0], 1.0))).into_handle()
    }

    #[test]
    fn test_force_slot() {
        let forces = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(force_slot(&forces, 1).unwrap(), [4.0, 5.0, 6.0]);
        assert!(force_slot(&forces, 2).is_err());
    }

    #[test]
    fn test_unregistered_boundary_fails() {
        let mut registry = BoundaryRegistry::new();
        registry.add(wall());
        let err = boundary_force(&registry, None, &wall()).expect_err("never added");
        assert!(matches!(err, LatticeError::UnregisteredBoundary));
    }

    #[test]
    fn test_no_backend_is_zero() {
        let mut registry = BoundaryRegistry::new();
        let b = wall();
        registry.add(b.clone());
        assert_eq!(boundary_force(&registry, None, &b).unwrap(), [0.0; 3]);
    }

    #[test]
    fn test_cpu_force_comes_from_reduction() {
        let grid = Grid3D::new([4, 4, 4], 1.0);
        let mut registry = BoundaryRegistry::new();
        let (a, b) = (wall(), wall());
        registry.add(a.clone());
        registry.add(b.clone());
        let mut cpu = CpuBackend::new(grid, 0.1, [2, 1, 1]).unwrap();
        cpu.reclassify(registry.as_slice());
        cpu.locals_mut()[0].add_boundary_force(2, [1.0, 0.0, 0.0]).unwrap();
        cpu.locals_mut()[1].add_boundary_force(2, [1.0, 0.0, -1.0]).unwrap();
        let backend = ActiveBackend::Cpu(cpu);
        assert_eq!(boundary_force(&registry, Some(&backend), &a).unwrap(), [0.0; 3]);
        assert_eq!(
            boundary_force(&registry, Some(&backend), &b).unwrap(),
            [2.0, 0.0, -1.0]
        );
    }

    #[test]
    fn test_gpu_force_comes_from_device() {
        let grid = Grid3D::new([4, 4, 4], 1.0);
        let mut registry = BoundaryRegistry::new();
        let b = wall();
        registry.add(b.clone());
        let device = HostDevice::new(&grid);
        let buffer = device.force_buffer();
        let mut gpu = GpuBackend::new(0, grid, Box::new(device));
        gpu.reclassify(registry.as_slice()).unwrap();
        buffer.lock().copy_from_slice(&[0.5, -0.5, 2.0]);
        let backend = ActiveBackend::Gpu(gpu);
        assert_eq!(backend.name(), "gpu");
        assert_eq!(
            boundary_force(&registry, Some(&backend), &b).unwrap(),
            [0.5, -0.5, 2.0]
        );
        assert_eq!(
            match &backend {
                ActiveBackend::Gpu(g) => g.device().read_boundary_forces(1).unwrap(),
                ActiveBackend::Cpu(_) => unreachable!(),
            },
            vec![0.5, -0.5, 2.0]
        );
    }
}
