// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Lattice GPU
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Device-resident boundary state via wgpu compute shaders.
//!
//! Receives the compacted boundary tables built on the coordinating rank,
//! scatters them into dense per-node flag and velocity buffers, and owns the
//! per-boundary force buffer the device fluid solver accumulates into.

use bytemuck::{Pod, Zeroable};
use lattice_core::accelerator::{BoundaryTables, DeviceBoundaryState};
use lattice_types::constants::VEC3_STRIDE;
use lattice_types::error::{LatticeError, LatticeResult};
use lattice_types::state::Grid3D;
use std::borrow::Cow;

const WORKGROUP_SIZE: u32 = 64;
const MAX_GROUPS_PER_DIM: u32 = 65_535;

/// Uniform parameters passed to the compute shader.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct GpuParams {
    n_nodes: u32,
    n_boundnodes: u32,
    n_boundaries: u32,
    _pad: u32,
}

/// 2D dispatch covering `n` threads without exceeding the per-dimension limit.
fn dispatch_dims(n: u32) -> (u32, u32) {
    let groups = n.div_ceil(WORKGROUP_SIZE).max(1);
    let x = groups.min(MAX_GROUPS_PER_DIM);
    (x, groups.div_ceil(x))
}

/// Buffer byte size for `len` 4-byte elements; never zero.
fn buffer_size(len: usize) -> u64 {
    (len.max(1) * std::mem::size_of::<u32>()) as u64
}

/// Boundary state of a device fluid solver on one wgpu adapter.
pub struct GpuBoundaryState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    layout: wgpu::BindGroupLayout,
    pipeline_reset: wgpu::ComputePipeline,
    pipeline_scatter: wgpu::ComputePipeline,
    param_buffer: wgpu::Buffer,
    flags_buffer: wgpu::Buffer,
    node_velocity_buffer: wgpu::Buffer,
    forces_buffer: wgpu::Buffer,
    n_nodes: usize,
    n_boundaries: usize,
    n_boundnodes: usize,
}

impl GpuBoundaryState {
    /// Allocate device buffers for `grid`.
    ///
    /// Returns `Err` if no suitable GPU adapter is found.
    pub fn new(grid: &Grid3D) -> LatticeResult<Self> {
        let n_nodes = grid.volume();
        if n_nodes > u32::MAX as usize / VEC3_STRIDE {
            return Err(LatticeError::Device(format!(
                "Grid of {n_nodes} nodes exceeds 32-bit device indexing"
            )));
        }

        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| LatticeError::Device("No suitable GPU adapter found".to_string()))?;
        let adapter_name = adapter.get_info().name;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lattice-gpu"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .map_err(|e| LatticeError::Device(format!("GPU device request failed: {e}")))?;

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("boundary_init"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("boundary_init.wgsl"))),
        });

        let param_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("params"),
            size: std::mem::size_of::<GpuParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let flags_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("flags"),
            size: buffer_size(n_nodes),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let node_velocity_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("node_velocity"),
            size: buffer_size(VEC3_STRIDE * n_nodes),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let forces_buffer = Self::create_forces_buffer(&device, 0);

        let storage_entry = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("boundary_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1, true),  // node_list
                storage_entry(2, true),  // index_list
                storage_entry(3, true),  // velocity_table
                storage_entry(4, false), // flags
                storage_entry(5, false), // node_velocity
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("boundary_pipeline_layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline_reset = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("reset_flags_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader_module,
            entry_point: Some("reset_flags"),
            compilation_options: Default::default(),
            cache: None,
        });

        let pipeline_scatter = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("scatter_flags_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader_module,
            entry_point: Some("scatter_flags"),
            compilation_options: Default::default(),
            cache: None,
        });

        log::info!("lattice-gpu: {n_nodes} nodes on adapter '{adapter_name}'");

        Ok(Self {
            device,
            queue,
            adapter_name,
            layout,
            pipeline_reset,
            pipeline_scatter,
            param_buffer,
            flags_buffer,
            node_velocity_buffer,
            forces_buffer,
            n_nodes,
            n_boundaries: 0,
            n_boundnodes: 0,
        })
    }

    fn create_forces_buffer(device: &wgpu::Device, n_boundaries: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("boundary_forces"),
            size: buffer_size(VEC3_STRIDE * n_boundaries),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    }

    fn table_buffer(&self, label: &str, bytes: &[u8], len: usize) -> wgpu::Buffer {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: buffer_size(len),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        if !bytes.is_empty() {
            self.queue.write_buffer(&buffer, 0, bytes);
        }
        buffer
    }

    fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::ComputePipeline,
        bind_group: &wgpu::BindGroup,
        threads: usize,
    ) {
        if threads == 0 {
            return;
        }
        let (gx, gy) = dispatch_dims(threads as u32);
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: None,
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(gx, gy, 1);
    }

    /// Copy `size` bytes of `src` to a mappable buffer and read them back.
    fn read_back(&self, src: &wgpu::Buffer, size: u64) -> LatticeResult<Vec<u8>> {
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("download_encoder"),
            });
        encoder.copy_buffer_to_buffer(src, 0, &staging, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|e| LatticeError::Device(format!("GPU download channel error: {e}")))?
            .map_err(|e| LatticeError::Device(format!("GPU buffer map failed: {e}")))?;

        let data = buffer_slice.get_mapped_range();
        let bytes = data.to_vec();
        drop(data);
        staging.unmap();
        Ok(bytes)
    }

    /// Dense per-node boundary flags (0 = fluid), x-fastest.
    pub fn download_flags(&self) -> LatticeResult<Vec<u32>> {
        if self.n_nodes == 0 {
            return Ok(Vec::new());
        }
        let bytes = self.read_back(&self.flags_buffer, buffer_size(self.n_nodes))?;
        Ok(bytemuck::cast_slice(&bytes).to_vec())
    }

    /// Dense per-node boundary velocity, `3 * n_nodes` values.
    pub fn download_node_velocity(&self) -> LatticeResult<Vec<f32>> {
        if self.n_nodes == 0 {
            return Ok(Vec::new());
        }
        let size = buffer_size(VEC3_STRIDE * self.n_nodes);
        let bytes = self.read_back(&self.node_velocity_buffer, size)?;
        Ok(bytemuck::cast_slice(&bytes).to_vec())
    }

    /// Overwrite the per-boundary force buffer, as the device solver does
    /// after each step.
    pub fn write_boundary_forces(&self, forces: &[f32]) -> LatticeResult<()> {
        if forces.len() != VEC3_STRIDE * self.n_boundaries {
            return Err(LatticeError::Device(format!(
                "write_boundary_forces: expected {} values, got {}",
                VEC3_STRIDE * self.n_boundaries,
                forces.len()
            )));
        }
        if !forces.is_empty() {
            self.queue
                .write_buffer(&self.forces_buffer, 0, bytemuck::cast_slice(forces));
        }
        Ok(())
    }

    /// Per-boundary force buffer, for binding into the device fluid solver.
    pub fn forces_buffer(&self) -> &wgpu::Buffer {
        &self.forces_buffer
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    pub fn number_of_boundnodes(&self) -> usize {
        self.n_boundnodes
    }
}

impl DeviceBoundaryState for GpuBoundaryState {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn upload_boundaries(&mut self, tables: &BoundaryTables) -> LatticeResult<()> {
        if tables.node_list.len() != tables.index_list.len() {
            return Err(LatticeError::Device(format!(
                "Boundary tables disagree: {} nodes, {} owners",
                tables.node_list.len(),
                tables.index_list.len()
            )));
        }
        if let Some(&node) = tables.node_list.iter().find(|&&n| n as usize >= self.n_nodes) {
            return Err(LatticeError::Device(format!(
                "Boundary node {node} outside device grid of {} nodes",
                self.n_nodes
            )));
        }

        let n_boundaries = tables.number_of_boundaries();
        let n_boundnodes = tables.number_of_boundnodes();
        let params = GpuParams {
            n_nodes: self.n_nodes as u32,
            n_boundnodes: n_boundnodes as u32,
            n_boundaries: n_boundaries as u32,
            _pad: 0,
        };
        self.queue
            .write_buffer(&self.param_buffer, 0, bytemuck::bytes_of(&params));

        let node_buffer = self.table_buffer(
            "node_list",
            bytemuck::cast_slice(&tables.node_list),
            n_boundnodes,
        );
        let index_buffer = self.table_buffer(
            "index_list",
            bytemuck::cast_slice(&tables.index_list),
            n_boundnodes,
        );
        let velocity_buffer = self.table_buffer(
            "velocity_table",
            bytemuck::cast_slice(&tables.velocity),
            tables.velocity.len(),
        );

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("boundary_bind_group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.param_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: node_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: index_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: velocity_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: self.flags_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: self.node_velocity_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("boundary_init_encoder"),
            });
        self.dispatch(&mut encoder, &self.pipeline_reset, &bind_group, self.n_nodes);
        self.dispatch(&mut encoder, &self.pipeline_scatter, &bind_group, n_boundnodes);
        self.queue.submit(Some(encoder.finish()));

        // fresh, zeroed force accumulator for the new boundary set
        self.forces_buffer = Self::create_forces_buffer(&self.device, n_boundaries);
        self.n_boundaries = n_boundaries;
        self.n_boundnodes = n_boundnodes;

        self.device.poll(wgpu::Maintain::Wait);
        log::debug!(
            "lattice-gpu: scattered {n_boundnodes} boundary nodes for {n_boundaries} boundaries"
        );
        Ok(())
    }

    fn boundary_flags(&self) -> LatticeResult<Vec<u32>> {
        self.download_flags()
    }

    fn read_boundary_forces(&self, n_boundaries: usize) -> LatticeResult<Vec<f64>> {
        if n_boundaries != self.n_boundaries {
            return Err(LatticeError::Device(format!(
                "Device holds forces for {} boundaries, {} requested",
                self.n_boundaries, n_boundaries
            )));
        }
        if n_boundaries == 0 {
            return Ok(Vec::new());
        }
        let size = buffer_size(VEC3_STRIDE * n_boundaries);
        let bytes = self.read_back(&self.forces_buffer, size)?;
        let forces: &[f32] = bytemuck::cast_slice(&bytes);
        Ok(forces.iter().map(|&f| f as f64).collect())
    }
}

/// Check if a GPU adapter is available without allocating device state.
pub fn gpu_available() -> bool {
    let instance = wgpu::Instance::default();
    pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .is_some()
}

/// Get GPU adapter info string.
pub fn gpu_info() -> Option<String> {
    let instance = wgpu::Instance::default();
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;
    let info = adapter.get_info();
    Some(format!(
        "{} ({:?}, {:?})",
        info.name, info.backend, info.device_type
    ))
}
