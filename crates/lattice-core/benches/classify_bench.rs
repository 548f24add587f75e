// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Classification Sweep Benchmark
// © 1998–2026 Miroslav Šotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use criterion::{criterion_group, criterion_main, Criterion};
use lattice_core::accelerator::build_boundary_tables;
use lattice_core::boundary::{Boundary, BoundaryHandle};
use lattice_core::cpu::CpuBackend;
use lattice_core::shapes::{Cylinder, Sphere, Wall};
use lattice_types::state::Grid3D;
use std::hint::black_box;
use std::sync::Arc;

fn channel_with_obstacles(n: usize) -> Vec<BoundaryHandle> {
    let l = n as f64;
    vec![
        Boundary::new(Arc::new(Wall::new([1.0, 0.0, 0.0], 1.0))).into_handle(),
        Boundary::new(Arc::new(Wall::new([-1.0, 0.0, 0.0], -(l - 1.0))))
            .with_velocity([0.0, 0.0, 0.05])
            .into_handle(),
        Boundary::new(Arc::new(Sphere::new([l / 2.0, l / 2.0, l / 3.0], l / 8.0)))
            .with_charge_density(0.1)
            .into_handle(),
        Boundary::new(Arc::new(Cylinder::new(
            [l / 2.0, l / 2.0, 2.0 * l / 3.0],
            [0.0, 1.0, 0.0],
            l / 10.0,
            l / 2.0,
        )))
        .into_handle(),
    ]
}

fn bench_global_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("global_tables");

    for &n in &[16usize, 32, 64] {
        let grid = Grid3D::new([n, n, n], 1.0);
        let boundaries = channel_with_obstacles(n);
        let label = format!("{n}^3_{}boundaries", boundaries.len());
        group.bench_function(&label, |b| {
            b.iter(|| {
                let tables = build_boundary_tables(&grid, &boundaries)
                    .expect("tables should build");
                black_box(tables.number_of_boundnodes());
            })
        });
    }

    group.finish();
}

fn bench_partitioned_sweep(c: &mut Criterion) {
    let n = 32;
    let grid = Grid3D::new([n, n, n], 1.0);
    let boundaries = channel_with_obstacles(n);
    let mut group = c.benchmark_group("partitioned_sweep");

    for node_grid in [[1, 1, 1], [2, 2, 2], [4, 2, 2]] {
        let mut backend = CpuBackend::new(grid, 0.01, node_grid).expect("decomposition");
        let label = format!("{n}^3_{}x{}x{}", node_grid[0], node_grid[1], node_grid[2]);
        group.bench_function(&label, |b| {
            b.iter(|| black_box(backend.reclassify(&boundaries)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_global_tables, bench_partitioned_sweep);
criterion_main!(benches);
