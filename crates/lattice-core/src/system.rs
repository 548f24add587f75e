// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Boundary Service
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! `LbBoundaries`: the boundary registry bound to one fluid backend.
//!
//! Constructed at solver setup and dropped at shutdown. Every mutation
//! re-classifies the active backend's whole grid and rebuilds the
//! electrokinetic wall charge from scratch.

use crate::accelerator::{DeviceBoundaryState, GpuBackend, HostDevice};
use crate::boundary::{Boundary, BoundaryHandle};
use crate::cpu::CpuBackend;
use crate::electrokinetics::{reset_net_charges, ElectrokineticState, WallChargeCoupling};
use crate::force::{boundary_force, ActiveBackend};
use crate::registry::BoundaryRegistry;
use lattice_types::config::{BackendKind, LatticeConfig};
use lattice_types::error::{LatticeError, LatticeResult};
use lattice_types::state::{ClassificationReport, Grid3D, Vec3};
use std::time::Instant;

#[derive(Debug, Default)]
pub struct LbBoundaries {
    registry: BoundaryRegistry,
    backend: Option<ActiveBackend>,
    electrokinetics: Option<ElectrokineticState>,
    runtime_errors: Vec<LatticeError>,
}

impl LbBoundaries {
    /// Empty registry, no backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an in-process partitioned backend over `node_grid` ranks.
    pub fn with_cpu_backend(
        mut self,
        global: Grid3D,
        tau: f64,
        node_grid: [usize; 3],
    ) -> LatticeResult<Self> {
        let cpu = CpuBackend::new(global, tau, node_grid)?;
        log::info!(
            "partitioned backend: {:?} nodes over process grid {:?}",
            global.dims,
            node_grid
        );
        self.set_backend(ActiveBackend::Cpu(cpu))?;
        Ok(self)
    }

    /// Attach a global-grid backend seen from rank `this_node`.
    pub fn with_gpu_backend(
        mut self,
        this_node: usize,
        global: Grid3D,
        device: Box<dyn DeviceBoundaryState>,
    ) -> LatticeResult<Self> {
        log::info!(
            "global backend on device '{}': {:?} nodes, rank {}",
            device.name(),
            global.dims,
            this_node
        );
        self.set_backend(ActiveBackend::Gpu(GpuBackend::new(this_node, global, device)))?;
        Ok(self)
    }

    /// Build from a validated config. A `gpu` backend uses the host device;
    /// see [`LbBoundaries::from_config_with_device`] for a real accelerator.
    pub fn from_config(cfg: &LatticeConfig) -> LatticeResult<Self> {
        let device = Box::new(HostDevice::new(&cfg.create_grid()));
        Self::from_config_with_device(cfg, device)
    }

    /// Build from a config; `device` is used only for the `gpu` backend.
    pub fn from_config_with_device(
        cfg: &LatticeConfig,
        device: Box<dyn DeviceBoundaryState>,
    ) -> LatticeResult<Self> {
        cfg.validate()?;
        let grid = cfg.create_grid();
        let mut system = LbBoundaries::new();
        for b in &cfg.boundaries {
            system.registry.add(Boundary::from_config(b).into_handle());
        }
        if let Some(ek) = &cfg.electrokinetics {
            system.electrokinetics = Some(ElectrokineticState::from_config(ek, &grid));
        }
        let system = match cfg.backend {
            BackendKind::Cpu => system.with_cpu_backend(grid, cfg.lattice.tau, cfg.node_grid)?,
            BackendKind::Gpu => system.with_gpu_backend(cfg.this_node, grid, device)?,
        };
        log::info!(
            "system '{}': {} boundaries on {:?} backend",
            cfg.system_name,
            system.len(),
            cfg.backend
        );
        Ok(system)
    }

    /// Replace the active backend and classify its grid.
    pub fn set_backend(&mut self, backend: ActiveBackend) -> LatticeResult<ClassificationReport> {
        self.backend = Some(backend);
        self.reclassify()
    }

    /// Attach (or replace) the electrokinetic solver state.
    pub fn set_electrokinetics(
        &mut self,
        state: ElectrokineticState,
    ) -> LatticeResult<ClassificationReport> {
        if let Some(grid) = self.backend_grid() {
            if state.dims() != grid.dims {
                return Err(LatticeError::ConfigError(format!(
                    "Electrokinetic lattice {:?} does not match fluid lattice {:?}",
                    state.dims(),
                    grid.dims
                )));
            }
        }
        self.electrokinetics = Some(state);
        self.reclassify()
    }

    /// Global lattice of the active backend.
    fn backend_grid(&self) -> Option<Grid3D> {
        match self.backend.as_ref()? {
            ActiveBackend::Cpu(cpu) => Some(*cpu.global()),
            ActiveBackend::Gpu(gpu) => Some(*gpu.grid()),
        }
    }

    /// Register `boundary` and re-classify.
    pub fn add(&mut self, boundary: BoundaryHandle) -> LatticeResult<()> {
        self.registry.add(boundary);
        self.reclassify().map(|_| ())
    }

    /// Unregister the first entry identical to `boundary` and re-classify.
    /// Removing an absent boundary leaves the registry as it was.
    pub fn remove(&mut self, boundary: &BoundaryHandle) -> LatticeResult<()> {
        if !self.registry.remove(boundary) {
            log::warn!("remove: boundary not registered, registry unchanged");
        }
        self.reclassify().map(|_| ())
    }

    /// Full classification pass over the active backend's grid.
    ///
    /// The sweep always runs; an electrokinetic lattice mismatch is returned
    /// afterwards and no wall charge is deposited.
    pub fn reclassify(&mut self) -> LatticeResult<ClassificationReport> {
        let start = Instant::now();
        let boundaries = self.registry.as_slice();
        reset_net_charges(boundaries);

        let Some(backend) = self.backend.as_mut() else {
            return Ok(ClassificationReport {
                n_boundaries: boundaries.len(),
                ..Default::default()
            });
        };
        let global = match backend {
            ActiveBackend::Cpu(cpu) => *cpu.global(),
            ActiveBackend::Gpu(gpu) => *gpu.grid(),
        };

        let coupling = self
            .electrokinetics
            .as_ref()
            .filter(|ek| ek.is_active())
            .map(|ek| WallChargeCoupling::prepare(boundaries, ek, &global))
            .transpose();
        if matches!(&coupling, Ok(Some(c)) if c.missing_species()) {
            log::error!("{}", LatticeError::NoWallChargeSpecies);
            self.runtime_errors.push(LatticeError::NoWallChargeSpecies);
        }

        let (swept, boundary_nodes) = match backend {
            ActiveBackend::Cpu(cpu) => {
                let n = cpu.reclassify(boundaries);
                (true, n)
            }
            ActiveBackend::Gpu(gpu) => {
                let swept = gpu.reclassify(boundaries)?;
                (swept, gpu.tables().number_of_boundnodes())
            }
        };

        let coupling = coupling?;
        if let (Some(coupling), Some(ek), true) =
            (coupling, self.electrokinetics.as_mut(), swept)
        {
            let nodes = match backend {
                ActiveBackend::Cpu(cpu) => cpu.owned_boundary_nodes(),
                ActiveBackend::Gpu(gpu) => gpu.tables().boundary_nodes(),
            };
            coupling.deposit(boundaries, &nodes, ek);
        }

        let report = ClassificationReport {
            n_boundaries: boundaries.len(),
            boundary_nodes,
            fluid_nodes: if swept {
                global.volume() - boundary_nodes
            } else {
                0
            },
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        };
        log::debug!(
            "{} backend: {} boundaries, {} boundary nodes, {} fluid nodes in {:.3} ms",
            backend.name(),
            report.n_boundaries,
            report.boundary_nodes,
            report.fluid_nodes,
            report.elapsed_ms
        );
        Ok(report)
    }

    /// Hydrodynamic force on `boundary`; fails if it is not registered.
    pub fn get_force(&self, boundary: &BoundaryHandle) -> LatticeResult<Vec3> {
        boundary_force(&self.registry, self.backend.as_ref(), boundary)
    }

    /// Drain configuration errors reported during past passes.
    pub fn take_runtime_errors(&mut self) -> Vec<LatticeError> {
        std::mem::take(&mut self.runtime_errors)
    }

    pub fn registry(&self) -> &BoundaryRegistry {
        &self.registry
    }

    pub fn boundaries(&self) -> &[BoundaryHandle] {
        self.registry.as_slice()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// 0-based boundary index; nodes store index + 1.
    pub fn position(&self, boundary: &BoundaryHandle) -> Option<usize> {
        self.registry.position(boundary)
    }

    pub fn backend(&self) -> Option<&ActiveBackend> {
        self.backend.as_ref()
    }

    pub fn electrokinetics(&self) -> Option<&ElectrokineticState> {
        self.electrokinetics.as_ref()
    }

    pub fn cpu_backend(&self) -> Option<&CpuBackend> {
        match &self.backend {
            Some(ActiveBackend::Cpu(cpu)) => Some(cpu),
            _ => None,
        }
    }

    /// Mutable access for the fluid solver, e.g. to deposit boundary forces.
    pub fn cpu_backend_mut(&mut self) -> Option<&mut CpuBackend> {
        match &mut self.backend {
            Some(ActiveBackend::Cpu(cpu)) => Some(cpu),
            _ => None,
        }
    }

    pub fn gpu_backend(&self) -> Option<&GpuBackend> {
        match &self.backend {
            Some(ActiveBackend::Gpu(gpu)) => Some(gpu),
            _ => None,
        }
    }

    pub fn gpu_backend_mut(&mut self) -> Option<&mut GpuBackend> {
        match &mut self.backend {
            Some(ActiveBackend::Gpu(gpu)) => Some(gpu),
            _ => None,
        }
    }
}
